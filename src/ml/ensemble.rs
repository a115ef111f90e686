/// Weighted blend of the two model forecasts.
///
/// `alpha` weights the trend forecast; it is not clamped, so values outside
/// [0, 1] extrapolate past either model.
pub fn blend(alpha: f64, trend: f64, autoregressive: f64) -> f64 {
    alpha * trend + (1.0 - alpha) * autoregressive
}
