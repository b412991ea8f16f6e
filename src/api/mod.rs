mod args;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};

pub use args::{
    AfpArgs, AfpScenario, Cli, Command, FiArgs, FundsArgs, build_afp_scenario, build_fi_inputs,
    build_fund_inputs, default_afp_args, default_fi_args, default_funds_args,
};

use crate::core::{
    AfpComparison, ConfidenceInterval, FiInputs, FundComparison, SimulationInputs, afp_comparison,
    compare_between_mutual_funds_and_etfs, financial_independence, real_return_rate, years_to_fi,
    years_to_fi_with_confidence, years_to_fi_within,
};
use crate::report::{write_afp_comparison, write_fi_report, write_fund_comparison};

/// Deterministic projections served over HTTP give up after this many years.
pub const API_MAX_YEARS: u32 = 1_000;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FiPayload {
    current_savings: Option<f64>,
    annual_expenses: Option<f64>,
    withdrawal_rate: Option<f64>,
    annual_investment: Option<f64>,
    annual_return_rate: Option<f64>,
    inflation_rate: Option<f64>,
    return_std_dev: Option<f64>,
    inflation_std_dev: Option<f64>,
    simulations: Option<u32>,
    confidence_level: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AfpPayload {
    years: Option<u32>,
    initial_investment: Option<f64>,
    salary: Option<f64>,
    first_afp_fee: Option<f64>,
    second_afp_fee: Option<f64>,
    first_afp_return_rate: Option<f64>,
    second_afp_return_rate: Option<f64>,
    afp_contribution_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FundsPayload {
    years: Option<u32>,
    initial_investment: Option<f64>,
    annual_investment: Option<f64>,
    return_rate: Option<f64>,
    mutual_fund_fee: Option<f64>,
    etf_fee: Option<f64>,
    dividend_yield: Option<f64>,
    chilean_tax: Option<f64>,
    sell_at_end: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FiResponse {
    target_amount: f64,
    real_return_rate: f64,
    /// `None` when the target is not met within [`API_MAX_YEARS`].
    years_to_fi: Option<u32>,
    max_years: u32,
    confidence: ConfidenceInterval,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Runs one CLI command, printing reports to stdout.
pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Fi(args) => {
            let (inputs, simulation) = build_fi_inputs(&args)?;
            run_fi_report(&inputs, &simulation)
        }
        Command::Afp(args) => {
            let cmp = run_afp(&build_afp_scenario(&args));
            write_afp_comparison(&mut io::stdout().lock(), &cmp).map_err(|e| e.to_string())
        }
        Command::Funds(args) => {
            let cmp = compare_between_mutual_funds_and_etfs(&build_fund_inputs(&args));
            write_fund_comparison(&mut io::stdout().lock(), &cmp).map_err(|e| e.to_string())
        }
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
    }
}

fn run_fi_report(inputs: &FiInputs, simulation: &SimulationInputs) -> Result<(), String> {
    let target = financial_independence(inputs.annual_expenses, inputs.withdrawal_rate)
        .map_err(|e| e.to_string())?;
    let years = years_to_fi(inputs).map_err(|e| e.to_string())?;
    let interval = years_to_fi_with_confidence(inputs, simulation).map_err(|e| e.to_string())?;

    write_fi_report(&mut io::stdout().lock(), target, years, &interval).map_err(|e| e.to_string())
}

fn run_afp(scenario: &AfpScenario) -> AfpComparison {
    afp_comparison(
        scenario.years,
        scenario.initial_investment,
        scenario.salary,
        scenario.first,
        scenario.second,
        scenario.afp_contribution_rate,
    )
}

pub async fn run_http_server(port: u16) -> io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/fi", get(fi_get_handler).post(fi_post_handler))
        .route("/api/afp", get(afp_get_handler).post(afp_post_handler))
        .route("/api/funds", get(funds_get_handler).post(funds_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "fi-projector HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/fi");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn fi_get_handler(Query(payload): Query<FiPayload>) -> Response {
    fi_handler_impl(payload)
}

async fn fi_post_handler(Json(payload): Json<FiPayload>) -> Response {
    fi_handler_impl(payload)
}

async fn afp_get_handler(Query(payload): Query<AfpPayload>) -> Response {
    afp_handler_impl(payload)
}

async fn afp_post_handler(Json(payload): Json<AfpPayload>) -> Response {
    afp_handler_impl(payload)
}

async fn funds_get_handler(Query(payload): Query<FundsPayload>) -> Response {
    funds_handler_impl(payload)
}

async fn funds_post_handler(Json(payload): Json<FundsPayload>) -> Response {
    funds_handler_impl(payload)
}

fn fi_handler_impl(payload: FiPayload) -> Response {
    let (inputs, simulation) = match fi_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    debug!(?inputs, ?simulation, "fi request");

    match build_fi_response(&inputs, &simulation) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn afp_handler_impl(payload: AfpPayload) -> Response {
    let scenario = afp_request_from_payload(payload);
    debug!(?scenario, "afp request");
    json_response(StatusCode::OK, run_afp(&scenario))
}

fn funds_handler_impl(payload: FundsPayload) -> Response {
    let args = funds_args_from_payload(payload);
    let inputs = build_fund_inputs(&args);
    debug!(?inputs, "funds request");
    let response: FundComparison = compare_between_mutual_funds_and_etfs(&inputs);
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

fn build_fi_response(
    inputs: &FiInputs,
    simulation: &SimulationInputs,
) -> Result<FiResponse, String> {
    let target_amount = financial_independence(inputs.annual_expenses, inputs.withdrawal_rate)
        .map_err(|e| e.to_string())?;
    let years = years_to_fi_within(inputs, API_MAX_YEARS).map_err(|e| e.to_string())?;
    let confidence = years_to_fi_with_confidence(inputs, simulation).map_err(|e| e.to_string())?;

    Ok(FiResponse {
        target_amount,
        real_return_rate: real_return_rate(inputs.annual_return_rate, inputs.inflation_rate),
        years_to_fi: years,
        max_years: API_MAX_YEARS,
        confidence,
    })
}

fn fi_request_from_payload(payload: FiPayload) -> Result<(FiInputs, SimulationInputs), String> {
    let mut args = default_fi_args();

    if let Some(v) = payload.current_savings {
        args.current_savings = v;
    }
    if let Some(v) = payload.annual_expenses {
        args.annual_expenses = v;
    }
    if let Some(v) = payload.withdrawal_rate {
        args.withdrawal_rate = v;
    }
    if let Some(v) = payload.annual_investment {
        args.annual_investment = v;
    }
    if let Some(v) = payload.annual_return_rate {
        args.annual_return_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.return_std_dev {
        args.return_std_dev = v;
    }
    if let Some(v) = payload.inflation_std_dev {
        args.inflation_std_dev = v;
    }
    if let Some(v) = payload.simulations {
        args.simulations = v;
    }
    if let Some(v) = payload.confidence_level {
        args.confidence_level = v;
    }
    if payload.seed.is_some() {
        args.seed = payload.seed;
    }

    build_fi_inputs(&args)
}

fn afp_request_from_payload(payload: AfpPayload) -> AfpScenario {
    let mut args = default_afp_args();

    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.initial_investment {
        args.initial_investment = v;
    }
    if let Some(v) = payload.salary {
        args.salary = v;
    }
    if let Some(v) = payload.first_afp_fee {
        args.first_afp_fee = v;
    }
    if let Some(v) = payload.second_afp_fee {
        args.second_afp_fee = v;
    }
    if let Some(v) = payload.first_afp_return_rate {
        args.first_afp_return_rate = v;
    }
    if let Some(v) = payload.second_afp_return_rate {
        args.second_afp_return_rate = v;
    }
    if let Some(v) = payload.afp_contribution_rate {
        args.afp_contribution_rate = v;
    }

    build_afp_scenario(&args)
}

fn funds_args_from_payload(payload: FundsPayload) -> FundsArgs {
    let mut args = default_funds_args();

    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.initial_investment {
        args.initial_investment = v;
    }
    if let Some(v) = payload.annual_investment {
        args.annual_investment = v;
    }
    if let Some(v) = payload.return_rate {
        args.return_rate = v;
    }
    if let Some(v) = payload.mutual_fund_fee {
        args.mutual_fund_fee = v;
    }
    if let Some(v) = payload.etf_fee {
        args.etf_fee = v;
    }
    if let Some(v) = payload.dividend_yield {
        args.dividend_yield = v;
    }
    if let Some(v) = payload.chilean_tax {
        args.chilean_tax = v;
    }
    if let Some(v) = payload.sell_at_end {
        args.sell_at_end = v;
    }

    args
}
