use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Review state of an application. `Action` means "action required".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(alias = "action_required", alias = "action-required")]
    Action,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::Action,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Action => "action",
        }
    }

    /// Label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "На рассмотрении",
            ApplicationStatus::Approved => "Одобрено",
            ApplicationStatus::Rejected => "Отклонено",
            ApplicationStatus::Action => "Требует действий",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "action" | "action_required" | "action-required" => Ok(ApplicationStatus::Action),
            _ => Err(()),
        }
    }
}

/// Kind of creditor the letter is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CreditorType {
    /// Second-tier bank.
    Bank,
    /// Microfinance organization.
    Mfo,
    /// Collection agency.
    Collector,
}

impl FromStr for CreditorType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bank" => Ok(CreditorType::Bank),
            "mfo" | "microfinance-organization" => Ok(CreditorType::Mfo),
            "collector" | "collection-agency" => Ok(CreditorType::Collector),
            _ => Err(()),
        }
    }
}

/// Remedy the borrower asks for. Stored and serialized as the Russian label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
pub enum RequestType {
    #[serde(rename = "Реструктуризация долга")]
    #[sqlx(rename = "Реструктуризация долга")]
    Restructuring,
    #[serde(rename = "Отсрочка платежа")]
    #[sqlx(rename = "Отсрочка платежа")]
    Deferral,
    #[serde(rename = "Списание пени и штрафов")]
    #[sqlx(rename = "Списание пени и штрафов")]
    PenaltyWaiver,
    #[serde(rename = "Досудебное урегулирование")]
    #[sqlx(rename = "Досудебное урегулирование")]
    PreTrialSettlement,
    #[serde(rename = "Снижение процентной ставки")]
    #[sqlx(rename = "Снижение процентной ставки")]
    RateReduction,
    #[serde(rename = "Другое")]
    #[sqlx(rename = "Другое")]
    Other,
}

impl RequestType {
    pub const ALL: [RequestType; 6] = [
        RequestType::Restructuring,
        RequestType::Deferral,
        RequestType::PenaltyWaiver,
        RequestType::PreTrialSettlement,
        RequestType::RateReduction,
        RequestType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RequestType::Restructuring => "Реструктуризация долга",
            RequestType::Deferral => "Отсрочка платежа",
            RequestType::PenaltyWaiver => "Списание пени и штрафов",
            RequestType::PreTrialSettlement => "Досудебное урегулирование",
            RequestType::RateReduction => "Снижение процентной ставки",
            RequestType::Other => "Другое",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            RequestType::Restructuring => "restructuring",
            RequestType::Deferral => "deferral",
            RequestType::PenaltyWaiver => "penalty_waiver",
            RequestType::PreTrialSettlement => "pre_trial_settlement",
            RequestType::RateReduction => "rate_reduction",
            RequestType::Other => "other",
        }
    }
}

impl FromStr for RequestType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RequestType::ALL
            .into_iter()
            .find(|t| t.label() == s || t.slug() == s)
            .ok_or(())
    }
}

/// Application row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub creditor_type: CreditorType,
    pub creditor_name: String,
    pub request_type: RequestType,
    pub contract_number: Option<String>,
    pub debt_amount: Option<f64>,
    pub monthly_income: Option<f64>,
    pub dependents: i64,
    pub description: Option<String>,
    pub generated_text: String,
    pub status: ApplicationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Per-owner status counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
pub struct ApplicationStats {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
    pub action: i64,
    pub rejected: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_wire_value_and_aliases() {
        assert_eq!("action".parse(), Ok(ApplicationStatus::Action));
        assert_eq!("action-required".parse(), Ok(ApplicationStatus::Action));
        assert_eq!("action_required".parse(), Ok(ApplicationStatus::Action));
        assert_eq!(" approved ".parse(), Ok(ApplicationStatus::Approved));
        assert!("archived".parse::<ApplicationStatus>().is_err());
        assert!("".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn status_serializes_to_wire_value() {
        let json = serde_json::to_string(&ApplicationStatus::ALL).unwrap();
        assert_eq!(json, r#"["pending","approved","rejected","action"]"#);
    }

    #[test]
    fn status_deserializes_like_it_parses() {
        let parsed: Vec<ApplicationStatus> =
            serde_json::from_str(r#"["pending","approved","rejected","action","action_required"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                ApplicationStatus::Pending,
                ApplicationStatus::Approved,
                ApplicationStatus::Rejected,
                ApplicationStatus::Action,
                ApplicationStatus::Action,
            ]
        );
        assert!(serde_json::from_str::<ApplicationStatus>(r#""archived""#).is_err());
    }

    #[test]
    fn request_type_accepts_label_and_slug() {
        assert_eq!(
            "Реструктуризация долга".parse(),
            Ok(RequestType::Restructuring)
        );
        assert_eq!("rate_reduction".parse(), Ok(RequestType::RateReduction));
        assert!("Банкротство".parse::<RequestType>().is_err());
        for t in RequestType::ALL {
            assert_eq!(t.label().parse(), Ok(t));
            assert_eq!(
                serde_json::to_value(t).unwrap(),
                serde_json::Value::String(t.label().to_string())
            );
        }
    }

    #[test]
    fn creditor_type_parsing() {
        assert_eq!("bank".parse(), Ok(CreditorType::Bank));
        assert_eq!("mfo".parse(), Ok(CreditorType::Mfo));
        assert_eq!("collection-agency".parse(), Ok(CreditorType::Collector));
        assert!("pawnshop".parse::<CreditorType>().is_err());
    }
}
