mod admin;
mod checkout;
mod helpers;
mod notifications;
mod refunds;
