use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::{
        Json, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    ComparisonBar, DEFAULT_COST_BASIS, DEFAULT_HOLDING_PERIOD, DEFAULT_STATE_CODE,
    DEFAULT_STOCK_VALUE, DEFAULT_TICKER, ProjectionAssumptions, ProjectionEngine, ProjectionYear,
    RateLookup, ScenarioInput, TaxProjection, ValidationError, comparison_bars, format_rate_pct,
    format_usd, list_sorted, lookup_rate,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    ticker: Option<String>,
    stock_value: Option<f64>,
    cost_basis: Option<f64>,
    state: Option<String>,
    state_tax_rate: Option<f64>,
    holding_period: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taxdefer",
    about = "Cost of selling a concentrated stock position versus deferring the gain through an exchange fund",
    after_help = "Run `taxdefer serve [port]` to start the HTTP API instead."
)]
pub struct Cli {
    #[arg(long, default_value = DEFAULT_TICKER, help = "Display label for the position")]
    ticker: String,
    #[arg(
        long,
        default_value_t = DEFAULT_STOCK_VALUE,
        allow_negative_numbers = true,
        help = "Current fair market value of the position in dollars"
    )]
    stock_value: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_COST_BASIS,
        allow_negative_numbers = true,
        help = "Cost basis in dollars; values above --stock-value are clamped to it"
    )]
    cost_basis: f64,
    #[arg(
        long,
        default_value = DEFAULT_STATE_CODE,
        help = "Jurisdiction code used to look up the state capital gains rate, e.g. CA"
    )]
    state: String,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "State capital gains rate in percent; overrides the rate looked up from --state"
    )]
    state_tax_rate: Option<f64>,
    #[arg(
        long,
        default_value_t = DEFAULT_HOLDING_PERIOD,
        help = "Holding horizon in years (1-30)"
    )]
    holding_period: u32,
    #[arg(long, help = "Print the full projection as JSON")]
    json: bool,
}

#[derive(Debug)]
struct ScenarioRequest {
    input: ScenarioInput,
    jurisdiction: RateLookup,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplayFigures {
    unrealized_gain: String,
    federal_tax: String,
    niit_tax: String,
    state_tax: String,
    total_tax: String,
    state_tax_rate: String,
    sell_and_reinvest_future_value: String,
    deferred_exchange_future_value: String,
    opportunity_cost: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    scenario: ScenarioInput,
    jurisdiction: RateLookup,
    assumptions: ProjectionAssumptions,
    projection: TaxProjection,
    display: DisplayFigures,
    comparison: [ComparisonBar; 2],
    years: Vec<ProjectionYear>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_scenario(cli: &Cli) -> Result<ScenarioRequest, ValidationError> {
    let jurisdiction = lookup_rate(&cli.state);
    // An explicit rate is a manual override of the table default.
    let state_tax_rate = cli.state_tax_rate.unwrap_or(jurisdiction.rate);
    let input = ScenarioInput::new(
        &cli.ticker,
        cli.stock_value,
        cli.cost_basis,
        state_tax_rate,
        cli.holding_period,
    )?;
    Ok(ScenarioRequest {
        input,
        jurisdiction,
    })
}

fn default_cli() -> Cli {
    Cli {
        ticker: DEFAULT_TICKER.to_string(),
        stock_value: DEFAULT_STOCK_VALUE,
        cost_basis: DEFAULT_COST_BASIS,
        state: DEFAULT_STATE_CODE.to_string(),
        state_tax_rate: None,
        holding_period: DEFAULT_HOLDING_PERIOD,
        json: false,
    }
}

fn scenario_request_from_payload(
    payload: ProjectPayload,
) -> Result<ScenarioRequest, ValidationError> {
    let mut cli = default_cli();

    if let Some(v) = payload.ticker {
        cli.ticker = v;
    }
    if let Some(v) = payload.stock_value {
        cli.stock_value = v;
    }
    if let Some(v) = payload.cost_basis {
        cli.cost_basis = v;
    }
    if let Some(v) = payload.state {
        cli.state = v;
    }
    if let Some(v) = payload.state_tax_rate {
        cli.state_tax_rate = Some(v);
    }
    if let Some(v) = payload.holding_period {
        cli.holding_period = v;
    }

    build_scenario(&cli)
}

fn build_project_response(engine: &ProjectionEngine, request: ScenarioRequest) -> ProjectResponse {
    let input = request.input;
    let projection = engine.project(&input);
    let display = DisplayFigures {
        unrealized_gain: format_usd(projection.unrealized_gain),
        federal_tax: format_usd(projection.federal_tax),
        niit_tax: format_usd(projection.niit_tax),
        state_tax: format_usd(projection.state_tax),
        total_tax: format_usd(projection.total_tax),
        state_tax_rate: format_rate_pct(input.state_tax_rate()),
        sell_and_reinvest_future_value: format_usd(projection.sell_and_reinvest_future_value),
        deferred_exchange_future_value: format_usd(projection.deferred_exchange_future_value),
        opportunity_cost: format_usd(projection.opportunity_cost),
    };
    ProjectResponse {
        years: engine.trace(&input),
        comparison: comparison_bars(&projection),
        assumptions: *engine.assumptions(),
        scenario: input,
        jurisdiction: request.jurisdiction,
        projection,
        display,
    }
}

fn render_report(response: &ProjectResponse) -> String {
    let scenario = &response.scenario;
    let p = &response.projection;
    let d = &response.display;
    let a = &response.assumptions;
    let years = scenario.holding_period();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: stock value {}, cost basis {}",
        scenario.ticker(),
        format_usd(scenario.stock_value()),
        format_usd(scenario.cost_basis())
    );
    let _ = writeln!(
        out,
        "Jurisdiction: {} (state rate {})",
        response.jurisdiction.display_name, d.state_tax_rate
    );
    let _ = writeln!(
        out,
        "Horizon: {years} years at {} assumed annual growth",
        format_rate_pct(a.annual_growth_rate * 100.0)
    );
    let _ = writeln!(out);

    let rows = [
        ("Unrealized gain".to_string(), &d.unrealized_gain),
        (
            format!("Federal tax ({})", format_rate_pct(a.federal_rate * 100.0)),
            &d.federal_tax,
        ),
        (
            format!("NIIT ({})", format_rate_pct(a.niit_rate * 100.0)),
            &d.niit_tax,
        ),
        (format!("State tax ({})", d.state_tax_rate), &d.state_tax),
        ("Immediate liability".to_string(), &d.total_tax),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<28}{value:>16}");
    }
    let _ = writeln!(out);

    let rows = [
        (
            format!("Sell & Reinvest (year {years})"),
            &d.sell_and_reinvest_future_value,
        ),
        (
            format!("Exchange Fund (year {years})"),
            &d.deferred_exchange_future_value,
        ),
        ("Opportunity cost".to_string(), &d.opportunity_cost),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<28}{value:>16}");
    }

    if p.total_tax > 0.0 {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Paying {} today forgoes {years} years of compound growth on that capital.",
            d.total_tax
        );
    }
    out
}

/// One-shot projection for the command line.
pub fn run_cli(cli: &Cli) -> anyhow::Result<()> {
    let request = build_scenario(cli)?;
    if !request.jurisdiction.known {
        warn!(
            state = %request.jurisdiction.code,
            "unknown jurisdiction, state rate defaults to 0"
        );
    }
    let response = build_project_response(&ProjectionEngine::default(), request);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_report(&response));
    }
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "taxdefer HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/api/jurisdictions", get(list_jurisdictions_handler))
        .route("/api/jurisdictions/:code", get(jurisdiction_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
}

async fn list_jurisdictions_handler() -> Response {
    json_response(StatusCode::OK, list_sorted())
}

async fn jurisdiction_handler(Path(code): Path<String>) -> Response {
    json_response(StatusCode::OK, lookup_rate(&code))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(payload: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => project_handler_impl(payload).await,
        Err(rejection) => malformed_payload_response(&rejection.body_text()),
    }
}

async fn project_post_handler(payload: Result<Json<ProjectPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(payload).await,
        Err(rejection) => malformed_payload_response(&rejection.body_text()),
    }
}

// Extractor rejections are reported in the same JSON shape as validation errors.
fn malformed_payload_response(detail: &str) -> Response {
    warn!(%detail, "malformed projection payload");
    error_response(StatusCode::BAD_REQUEST, &format!("Invalid API payload: {detail}"))
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    debug!(?payload, "projection request");
    let request = match scenario_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(field = err.field(), error = %err, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };
    let response = build_project_response(&ProjectionEngine::default(), request);
    json_response(StatusCode::OK, response)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
