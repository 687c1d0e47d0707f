use std::fmt::Display;

use crate::db_types::PaymentState;

/// A transaction status as reported by MultiSafepay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PspStatus {
    Completed,
    Initialized,
    Uncleared,
    Void,
    Declined,
    Expired,
    Cancelled,
    Refunded,
    PartialRefunded,
    Other(String),
}

/// What a status means for the order's workflow, over and above the payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEffect {
    MarkFulfillable,
    LogUncleared,
    None,
}

/// Statuses are matched exactly, the way MultiSafepay spells them. Anything else is [`PspStatus::Other`].
impl From<&str> for PspStatus {
    fn from(value: &str) -> Self {
        match value {
            "completed" => Self::Completed,
            "initialized" => Self::Initialized,
            "uncleared" => Self::Uncleared,
            "void" => Self::Void,
            "declined" => Self::Declined,
            "expired" => Self::Expired,
            "cancelled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "partial_refunded" => Self::PartialRefunded,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl Display for PspStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PspStatus::Completed => write!(f, "completed"),
            PspStatus::Initialized => write!(f, "initialized"),
            PspStatus::Uncleared => write!(f, "uncleared"),
            PspStatus::Void => write!(f, "void"),
            PspStatus::Declined => write!(f, "declined"),
            PspStatus::Expired => write!(f, "expired"),
            PspStatus::Cancelled => write!(f, "cancelled"),
            PspStatus::Refunded => write!(f, "refunded"),
            PspStatus::PartialRefunded => write!(f, "partial_refunded"),
            PspStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

impl PspStatus {
    /// The local payment state for this status. Unrecognised statuses leave the payment untouched.
    pub fn payment_state(&self) -> Option<PaymentState> {
        match self {
            PspStatus::Completed => Some(PaymentState::Completed),
            PspStatus::Initialized => Some(PaymentState::New),
            PspStatus::Uncleared => Some(PaymentState::Authorization),
            PspStatus::Void | PspStatus::Declined | PspStatus::Cancelled => Some(PaymentState::AuthorizationVoided),
            PspStatus::Expired => Some(PaymentState::AuthorizationExpired),
            PspStatus::Refunded => Some(PaymentState::Refunded),
            PspStatus::PartialRefunded => Some(PaymentState::PartiallyRefunded),
            PspStatus::Other(_) => None,
        }
    }

    pub fn workflow_effect(&self) -> WorkflowEffect {
        match self {
            PspStatus::Completed => WorkflowEffect::MarkFulfillable,
            PspStatus::Uncleared => WorkflowEffect::LogUncleared,
            _ => WorkflowEffect::None,
        }
    }

    /// Money has been captured or is on its way, so the order may move into fulfillment.
    pub fn is_fulfillment_eligible(&self) -> bool {
        matches!(self, PspStatus::Completed | PspStatus::Uncleared)
    }
}

pub fn map_status(status: &str) -> Option<PaymentState> {
    PspStatus::from(status).payment_state()
}

pub fn is_fulfillment_eligible(status: &str) -> bool {
    PspStatus::from(status).is_fulfillment_eligible()
}
