use crate::db_types::Payment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(i64),
    AlreadyExists(i64),
}

impl InsertOrderResult {
    pub fn id(&self) -> i64 {
        match self {
            InsertOrderResult::Inserted(id) | InsertOrderResult::AlreadyExists(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPaymentResult {
    Inserted(Payment),
    AlreadyExists(Payment),
}

impl InsertPaymentResult {
    pub fn is_new(&self) -> bool {
        matches!(self, InsertPaymentResult::Inserted(_))
    }

    pub fn payment(&self) -> &Payment {
        match self {
            InsertPaymentResult::Inserted(p) | InsertPaymentResult::AlreadyExists(p) => p,
        }
    }

    pub fn into_payment(self) -> Payment {
        match self {
            InsertPaymentResult::Inserted(p) | InsertPaymentResult::AlreadyExists(p) => p,
        }
    }
}
