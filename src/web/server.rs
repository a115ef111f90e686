use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{api, AppState};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dashboard page
        .route("/", get(serve_dashboard))
        // Data endpoints
        .route("/api/health", get(api::health_check))
        .route("/api/summary", get(api::get_summary))
        .route("/api/series", get(api::get_series))
        .route("/api/inputs", get(api::get_inputs))
        // Forecast endpoints
        .route("/api/forecast", post(api::post_forecast))
        .route("/api/predict", post(api::post_predict))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address {}:{}: {}", host, port, e))?;
    info!("Forecast server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Automotive Sales Forecast</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/chartjs-adapter-date-fns"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background: #0f1419;
            color: #e7e9ea;
            min-height: 100vh;
        }
        .header {
            background: #16202a;
            padding: 1rem 2rem;
            border-bottom: 1px solid #2f3336;
            display: flex;
            justify-content: space-between;
            align-items: center;
        }
        .header h1 { font-size: 1.5rem; color: #1da1f2; }
        .header .meta { font-size: 0.875rem; color: #71767b; }

        .layout { display: grid; grid-template-columns: 280px 1fr; min-height: calc(100vh - 64px); }
        @media (max-width: 900px) { .layout { grid-template-columns: 1fr; } }

        .sidebar {
            background: #16202a;
            border-right: 1px solid #2f3336;
            padding: 1.5rem;
            display: flex;
            flex-direction: column;
            gap: 1.5rem;
        }
        .sidebar label {
            display: block;
            font-size: 0.75rem;
            color: #71767b;
            text-transform: uppercase;
            letter-spacing: 0.5px;
            margin-bottom: 0.5rem;
        }
        .sidebar input[type="date"] {
            width: 100%;
            padding: 0.5rem;
            background: #1c2732;
            border: 1px solid #2f3336;
            border-radius: 6px;
            color: #e7e9ea;
        }
        .sidebar input[type="range"] { width: 100%; }
        .alpha-value { font-weight: 700; color: #1da1f2; }
        .hint { font-size: 0.75rem; color: #71767b; margin-top: 0.25rem; }

        .btn {
            padding: 0.6rem 1rem;
            border: none;
            border-radius: 6px;
            font-size: 0.875rem;
            font-weight: 600;
            cursor: pointer;
            transition: all 0.2s;
        }
        .btn:disabled { opacity: 0.5; cursor: not-allowed; }
        .btn-primary { background: #1da1f2; color: white; }
        .btn-primary:hover:not(:disabled) { background: #1a91da; }

        .container { padding: 1.5rem; max-width: 1400px; width: 100%; }
        .grid { display: grid; gap: 1.5rem; }
        .grid-3 { grid-template-columns: repeat(3, 1fr); }
        .grid-2 { grid-template-columns: repeat(2, 1fr); }
        @media (max-width: 1200px) { .grid-3 { grid-template-columns: repeat(2, 1fr); } }
        @media (max-width: 768px) { .grid-3, .grid-2 { grid-template-columns: 1fr; } }

        .card {
            background: #16202a;
            border-radius: 12px;
            padding: 1.5rem;
            border: 1px solid #2f3336;
        }
        .card-title {
            font-size: 0.875rem;
            color: #71767b;
            text-transform: uppercase;
            letter-spacing: 0.5px;
            margin-bottom: 0.75rem;
        }
        .card-value { font-size: 2rem; font-weight: 700; }
        .card-subtitle { font-size: 0.875rem; color: #71767b; margin-top: 0.25rem; }
        .headline .card-value { color: #00ba7c; font-size: 2.5rem; }
        .trend { color: #ffad1f; }
        .autoregressive { color: #794bc4; }

        .formula {
            font-family: ui-monospace, SFMono-Regular, Menlo, monospace;
            font-size: 0.875rem;
            color: #71767b;
            margin-top: 0.75rem;
        }

        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 0.6rem; text-align: left; border-bottom: 1px solid #2f3336; }
        th { color: #71767b; font-weight: 500; font-size: 0.75rem; text-transform: uppercase; }
        td { font-size: 0.875rem; }
        .missing { color: #ffad1f; font-size: 0.875rem; }

        .chart-container { height: 420px; position: relative; }
        .mt-1 { margin-top: 1.5rem; }

        .toast {
            position: fixed;
            bottom: 1.5rem;
            right: 1.5rem;
            padding: 0.75rem 1.25rem;
            border-radius: 8px;
            font-size: 0.875rem;
            font-weight: 600;
        }
        .toast-error { background: #f4212e; color: white; }
    </style>
</head>
<body>
    <div class="header">
        <h1>Automotive Sales Forecast</h1>
        <div class="meta" id="data-range">Loading...</div>
    </div>

    <div class="layout">
        <aside class="sidebar">
            <div>
                <label for="query-date">Forecast date</label>
                <input type="date" id="query-date">
                <div class="hint">The forecast is made for one month before this date.</div>
            </div>
            <div>
                <label for="alpha">Trend weight (alpha): <span class="alpha-value" id="alpha-value">0.5</span></label>
                <input type="range" id="alpha" min="0" max="1" step="0.1" value="0.5">
                <div class="hint">1.0 = trend model only, 0.0 = seasonal ARIMA only.</div>
            </div>
            <button class="btn btn-primary" id="run-forecast" onclick="runForecast()">Forecast</button>
        </aside>

        <main class="container">
            <div class="grid grid-3">
                <div class="card headline">
                    <div class="card-title">Ensemble Forecast</div>
                    <div class="card-value" id="ensemble-value">-</div>
                    <div class="card-subtitle" id="target-caption">-</div>
                </div>
                <div class="card">
                    <div class="card-title">Trend Model</div>
                    <div class="card-value trend" id="trend-value">-</div>
                    <div class="card-subtitle">Bias corrected</div>
                </div>
                <div class="card">
                    <div class="card-title">Seasonal ARIMA</div>
                    <div class="card-value autoregressive" id="ar-value">-</div>
                    <div class="card-subtitle">Autoregressive model</div>
                </div>
            </div>
            <div class="formula" id="formula">-</div>

            <div class="grid grid-2 mt-1">
                <div class="card">
                    <div class="card-title">Exogenous Variables</div>
                    <div id="covariates">-</div>
                </div>
                <div class="card">
                    <div class="card-title">Debug</div>
                    <table>
                        <tbody>
                            <tr><td>Steps ahead</td><td id="debug-steps">-</td></tr>
                            <tr><td>Last training date</td><td id="debug-cutoff">-</td></tr>
                            <tr><td>Target date</td><td id="debug-target">-</td></tr>
                            <tr><td>Days difference</td><td id="debug-days">-</td></tr>
                            <tr><td>Crisis period</td><td id="debug-crisis">-</td></tr>
                        </tbody>
                    </table>
                </div>
            </div>

            <div class="card mt-1">
                <div class="card-title">Sales History and Forecast</div>
                <div class="chart-container">
                    <canvas id="forecast-chart"></canvas>
                </div>
            </div>
        </main>
    </div>

    <script>
        let summary;
        let forecastChart;

        const COVARIATE_LABELS = {
            exchange_rate: 'Exchange rate (EUR/TL)',
            interest_rate: 'Interest rate',
            credit_stock: 'Credit stock',
            tax_rate: 'Special consumption tax rate'
        };

        function formatUnits(value) {
            return Math.trunc(value).toLocaleString('en-US');
        }

        function showToast(type, message) {
            const toast = document.createElement('div');
            toast.className = 'toast toast-' + type;
            toast.textContent = message;
            document.body.appendChild(toast);
            setTimeout(() => toast.remove(), 4000);
        }

        function initChart(series) {
            const actual = series.map(p => ({ x: p.date, y: p.value }));
            forecastChart = new Chart(document.getElementById('forecast-chart'), {
                type: 'line',
                data: {
                    datasets: [
                        { label: 'Actual', data: actual, borderColor: '#1da1f2', pointRadius: 0, tension: 0.2 },
                        { label: 'Ensemble', data: [], borderColor: '#00ba7c', backgroundColor: '#00ba7c', pointRadius: 7, showLine: false },
                        { label: 'Trend', data: [], borderColor: '#ffad1f', backgroundColor: '#ffad1f', pointRadius: 5, pointStyle: 'triangle', showLine: false },
                        { label: 'Seasonal ARIMA', data: [], borderColor: '#794bc4', backgroundColor: '#794bc4', pointRadius: 5, pointStyle: 'rect', showLine: false },
                        { label: 'Target date', data: [], borderColor: '#71767b', borderDash: [6, 4], pointRadius: 0 }
                    ]
                },
                options: {
                    responsive: true,
                    maintainAspectRatio: false,
                    plugins: { legend: { display: true, labels: { color: '#e7e9ea' } } },
                    scales: {
                        x: { type: 'time', time: { unit: 'year' }, grid: { color: '#2f3336' }, ticks: { color: '#71767b' } },
                        y: { grid: { color: '#2f3336' }, ticks: { color: '#71767b' } }
                    }
                }
            });
        }

        function updateChart(r) {
            const values = forecastChart.data.datasets[0].data.map(p => p.y)
                .concat([r.ensemble_forecast, r.trend_forecast, r.autoregressive_forecast]);
            const low = Math.min(...values);
            const high = Math.max(...values);

            forecastChart.data.datasets[1].data = [{ x: r.target_date, y: r.ensemble_forecast }];
            forecastChart.data.datasets[2].data = [{ x: r.target_date, y: r.trend_forecast }];
            forecastChart.data.datasets[3].data = [{ x: r.target_date, y: r.autoregressive_forecast }];
            forecastChart.data.datasets[4].data = [{ x: r.target_date, y: low }, { x: r.target_date, y: high }];
            forecastChart.update();
        }

        function renderCovariates(r) {
            const el = document.getElementById('covariates');
            if (!r.covariates) {
                el.innerHTML = '<div class="missing">Values for ' + r.target_date +
                    ' are not in the dataset (future extrapolation).</div>';
                return;
            }
            let rows = '';
            for (const [key, label] of Object.entries(COVARIATE_LABELS)) {
                rows += '<tr><td>' + label + '</td><td>' + r.covariates[key].toFixed(2) + '</td></tr>';
            }
            el.innerHTML = '<table><tbody>' + rows + '</tbody></table>';
        }

        function renderResult(r) {
            document.getElementById('ensemble-value').textContent = formatUnits(r.ensemble_forecast) + ' units';
            document.getElementById('target-caption').textContent =
                'For ' + r.target_date + ' (1 month before ' + r.query_date + ')';
            document.getElementById('trend-value').textContent = formatUnits(r.trend_forecast);
            document.getElementById('ar-value').textContent = formatUnits(r.autoregressive_forecast);

            const a = r.alpha.toFixed(1);
            const b = (1 - r.alpha).toFixed(1);
            document.getElementById('formula').textContent =
                'Ensemble = ' + a + ' x Trend + ' + b + ' x Seasonal ARIMA';

            document.getElementById('debug-steps').textContent = r.steps_ahead;
            document.getElementById('debug-cutoff').textContent = summary.cutoff;
            document.getElementById('debug-target').textContent = r.target_date;
            document.getElementById('debug-days').textContent = r.days_diff;
            document.getElementById('debug-crisis').textContent = r.crisis_period ? 'yes' : 'no';

            renderCovariates(r);
            updateChart(r);
        }

        async function runForecast() {
            const button = document.getElementById('run-forecast');
            button.disabled = true;
            try {
                const response = await fetch('/api/forecast', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({
                        date: document.getElementById('query-date').value,
                        alpha: parseFloat(document.getElementById('alpha').value)
                    })
                });
                const body = await response.json();
                if (!response.ok) {
                    showToast('error', body.error || 'Forecast failed');
                    return;
                }
                renderResult(body);
            } catch (e) {
                showToast('error', 'Forecast request failed: ' + e);
            } finally {
                button.disabled = false;
            }
        }

        async function init() {
            summary = await fetch('/api/summary').then(r => r.json());
            const series = await fetch('/api/series').then(r => r.json());

            const dateInput = document.getElementById('query-date');
            dateInput.min = summary.first_date;
            dateInput.max = summary.last_date;
            dateInput.value = summary.default_date;

            const alpha = document.getElementById('alpha');
            alpha.value = summary.default_alpha;
            document.getElementById('alpha-value').textContent = Number(summary.default_alpha).toFixed(1);
            alpha.addEventListener('input', () => {
                document.getElementById('alpha-value').textContent = Number(alpha.value).toFixed(1);
            });

            document.getElementById('data-range').textContent =
                'Data ' + summary.first_date + ' to ' + summary.last_date + ', trained through ' + summary.cutoff;

            initChart(series);
            runForecast();
        }

        init().catch(e => showToast('error', 'Failed to load data: ' + e));
    </script>
</body>
</html>
"##;
