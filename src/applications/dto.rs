use serde::Deserialize;

/// Body of `POST /applications`. Enum fields arrive as strings and are
/// checked in the service so every failure shares one error shape.
#[derive(Debug, Default, Deserialize)]
pub struct CreateApplicationRequest {
    pub creditor_type: Option<String>,
    pub creditor_name: Option<String>,
    pub request_type: Option<String>,
    pub contract_number: Option<String>,
    pub debt_amount: Option<f64>,
    pub monthly_income: Option<f64>,
    pub dependents: Option<i64>,
    pub description: Option<String>,
}

/// Body of `PATCH /applications/:id/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}
