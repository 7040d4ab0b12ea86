//! Operation payloads and their on-wire request bodies
//!
//! Every Daraja call is the same shape: a typed payload is checked for empty
//! fields, reshaped into the upstream's PascalCase JSON body, and POSTed to a
//! fixed path. `Operation` is the one enum the dispatcher handles; each
//! variant maps to an endpoint via `OperationKind::path` and to a body via
//! `Operation::request_body`.
//!
//! Body field names follow the upstream schema exactly, including its
//! misspellings (`RecieverIdentifierType`, `Occassion`).

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::security::{Timestamp, password};

/// Default transaction type for STK push (paybill).
pub const CUSTOMER_PAYBILL_ONLINE: &str = "CustomerPayBillOnline";

/// Identifier type for an organisation short code.
pub const SHORTCODE_IDENTIFIER: &str = "4";

/// Identifier type for a customer MSISDN.
pub const MSISDN_IDENTIFIER: &str = "11";

/// C2B URL registration response type that completes transactions when
/// the validation URL is unreachable.
pub const RESPONSE_TYPE_COMPLETED: &str = "Completed";

/// Operation kinds, one per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    StkPush,
    B2c,
    C2bSimulate,
    C2bRegisterUrl,
    B2b,
    Reversal,
    AccountBalance,
}

impl OperationKind {
    /// Endpoint path, appended to the environment's base URL.
    pub fn path(&self) -> &'static str {
        match self {
            OperationKind::StkPush => "/mpesa/stkpush/v1/processrequest",
            OperationKind::B2c => "/mpesa/b2c/v1/paymentrequest",
            OperationKind::C2bSimulate => "/mpesa/c2b/v1/simulate",
            OperationKind::C2bRegisterUrl => "/mpesa/c2b/v1/registerurl",
            OperationKind::B2b => "/mpesa/b2b/v1/paymentrequest",
            OperationKind::Reversal => "/mpesa/reversal/v1/request",
            OperationKind::AccountBalance => "/mpesa/accountbalance/v1/query",
        }
    }

    /// Label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::StkPush => "stk_push",
            OperationKind::B2c => "b2c",
            OperationKind::C2bSimulate => "c2b_simulate",
            OperationKind::C2bRegisterUrl => "c2b_register_url",
            OperationKind::B2b => "b2b",
            OperationKind::Reversal => "reversal",
            OperationKind::AccountBalance => "account_balance",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lipa Na M-Pesa online (STK push) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StkPush {
    pub phone_number: String,
    pub amount: u64,
    pub account_reference: String,
    pub transaction_description: String,
    pub short_code: String,
    pub pass_key: String,
    pub callback_url: String,
    pub transaction_type: String,
}

/// Business-to-customer payment payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct B2c {
    pub initiator_name: String,
    pub security_credential: String,
    pub command_id: String,
    pub amount: u64,
    pub party_a: String,
    pub party_b: String,
    pub remarks: String,
    pub queue_timeout_url: String,
    pub result_url: String,
    pub occasion: Option<String>,
}

/// Customer-to-business simulation payload (sandbox testing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C2bSimulate {
    pub short_code: String,
    pub command_id: String,
    pub amount: u64,
    pub msisdn: String,
    pub bill_ref_number: String,
    pub pass_key: String,
}

/// C2B confirmation/validation URL registration payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C2bRegisterUrl {
    pub short_code: String,
    pub response_type: String,
    pub confirmation_url: String,
    pub validation_url: String,
}

/// Business-to-business transfer payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct B2b {
    pub initiator_name: String,
    pub security_credential: String,
    pub command_id: String,
    pub sender_identifier_type: String,
    pub receiver_identifier_type: String,
    pub amount: u64,
    pub party_a: String,
    pub party_b: String,
    pub account_reference: String,
    pub remarks: String,
    pub queue_timeout_url: String,
    pub result_url: String,
}

/// Transaction reversal payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reversal {
    pub initiator_name: String,
    pub security_credential: String,
    pub command_id: String,
    pub transaction_id: String,
    pub amount: u64,
    pub receiver_party: String,
    pub receiver_identifier_type: String,
    pub remarks: String,
    pub queue_timeout_url: String,
    pub result_url: String,
    pub occasion: Option<String>,
}

/// Account balance query payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub initiator_name: String,
    pub security_credential: String,
    pub command_id: String,
    pub party_a: String,
    pub identifier_type: String,
    pub remarks: String,
    pub queue_timeout_url: String,
    pub result_url: String,
}

/// One Daraja call, ready for `Mpesa::dispatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    StkPush(StkPush),
    B2c(B2c),
    C2bSimulate(C2bSimulate),
    C2bRegisterUrl(C2bRegisterUrl),
    B2b(B2b),
    Reversal(Reversal),
    AccountBalance(AccountBalance),
}

macro_rules! impl_from_payload {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Operation {
                fn from(payload: $variant) -> Self {
                    Operation::$variant(payload)
                }
            }
        )*
    };
}

impl_from_payload!(
    StkPush,
    B2c,
    C2bSimulate,
    C2bRegisterUrl,
    B2b,
    Reversal,
    AccountBalance,
);

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::StkPush(_) => OperationKind::StkPush,
            Operation::B2c(_) => OperationKind::B2c,
            Operation::C2bSimulate(_) => OperationKind::C2bSimulate,
            Operation::C2bRegisterUrl(_) => OperationKind::C2bRegisterUrl,
            Operation::B2b(_) => OperationKind::B2b,
            Operation::Reversal(_) => OperationKind::Reversal,
            Operation::AccountBalance(_) => OperationKind::AccountBalance,
        }
    }

    /// Required string fields as `(name, value)` pairs.
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Operation::StkPush(p) => vec![
                ("phone_number", p.phone_number.as_str()),
                ("account_reference", p.account_reference.as_str()),
                ("transaction_description", p.transaction_description.as_str()),
                ("short_code", p.short_code.as_str()),
                ("pass_key", p.pass_key.as_str()),
                ("callback_url", p.callback_url.as_str()),
                ("transaction_type", p.transaction_type.as_str()),
            ],
            Operation::B2c(p) => vec![
                ("initiator_name", p.initiator_name.as_str()),
                ("security_credential", p.security_credential.as_str()),
                ("command_id", p.command_id.as_str()),
                ("party_a", p.party_a.as_str()),
                ("party_b", p.party_b.as_str()),
                ("remarks", p.remarks.as_str()),
                ("queue_timeout_url", p.queue_timeout_url.as_str()),
                ("result_url", p.result_url.as_str()),
            ],
            Operation::C2bSimulate(p) => vec![
                ("short_code", p.short_code.as_str()),
                ("command_id", p.command_id.as_str()),
                ("msisdn", p.msisdn.as_str()),
                ("bill_ref_number", p.bill_ref_number.as_str()),
                ("pass_key", p.pass_key.as_str()),
            ],
            Operation::C2bRegisterUrl(p) => vec![
                ("short_code", p.short_code.as_str()),
                ("response_type", p.response_type.as_str()),
                ("confirmation_url", p.confirmation_url.as_str()),
                ("validation_url", p.validation_url.as_str()),
            ],
            Operation::B2b(p) => vec![
                ("initiator_name", p.initiator_name.as_str()),
                ("security_credential", p.security_credential.as_str()),
                ("command_id", p.command_id.as_str()),
                ("sender_identifier_type", p.sender_identifier_type.as_str()),
                ("receiver_identifier_type", p.receiver_identifier_type.as_str()),
                ("party_a", p.party_a.as_str()),
                ("party_b", p.party_b.as_str()),
                ("account_reference", p.account_reference.as_str()),
                ("remarks", p.remarks.as_str()),
                ("queue_timeout_url", p.queue_timeout_url.as_str()),
                ("result_url", p.result_url.as_str()),
            ],
            Operation::Reversal(p) => vec![
                ("initiator_name", p.initiator_name.as_str()),
                ("security_credential", p.security_credential.as_str()),
                ("command_id", p.command_id.as_str()),
                ("transaction_id", p.transaction_id.as_str()),
                ("receiver_party", p.receiver_party.as_str()),
                ("receiver_identifier_type", p.receiver_identifier_type.as_str()),
                ("remarks", p.remarks.as_str()),
                ("queue_timeout_url", p.queue_timeout_url.as_str()),
                ("result_url", p.result_url.as_str()),
            ],
            Operation::AccountBalance(p) => vec![
                ("initiator_name", p.initiator_name.as_str()),
                ("security_credential", p.security_credential.as_str()),
                ("command_id", p.command_id.as_str()),
                ("party_a", p.party_a.as_str()),
                ("identifier_type", p.identifier_type.as_str()),
                ("remarks", p.remarks.as_str()),
                ("queue_timeout_url", p.queue_timeout_url.as_str()),
                ("result_url", p.result_url.as_str()),
            ],
        }
    }

    /// Presence check on every required field. Reports all empty fields at once.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = self
            .required_fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "{} is missing required fields: {}",
                self.kind(),
                missing.join(", ")
            )))
        }
    }

    /// Build the on-wire body. `timestamp` feeds the derived
    /// `Timestamp`/`Password` pair for STK push and C2B simulate and is
    /// ignored by the other kinds.
    pub fn request_body(&self, timestamp: &Timestamp) -> RequestBody<'_> {
        match self {
            Operation::StkPush(p) => RequestBody::StkPush(StkPushBody {
                business_short_code: &p.short_code,
                password: password(&p.short_code, &p.pass_key, timestamp),
                timestamp: timestamp.as_str().to_string(),
                transaction_type: &p.transaction_type,
                amount: p.amount,
                party_a: &p.phone_number,
                party_b: &p.short_code,
                phone_number: &p.phone_number,
                callback_url: &p.callback_url,
                account_reference: &p.account_reference,
                transaction_desc: &p.transaction_description,
            }),
            Operation::B2c(p) => RequestBody::B2c(B2cBody {
                initiator_name: &p.initiator_name,
                security_credential: &p.security_credential,
                command_id: &p.command_id,
                amount: p.amount,
                party_a: &p.party_a,
                party_b: &p.party_b,
                remarks: &p.remarks,
                queue_timeout_url: &p.queue_timeout_url,
                result_url: &p.result_url,
                occasion: p.occasion.as_deref(),
            }),
            Operation::C2bSimulate(p) => RequestBody::C2bSimulate(C2bSimulateBody {
                short_code: &p.short_code,
                command_id: &p.command_id,
                amount: p.amount,
                msisdn: &p.msisdn,
                bill_ref_number: &p.bill_ref_number,
                timestamp: timestamp.as_str().to_string(),
                password: password(&p.short_code, &p.pass_key, timestamp),
            }),
            Operation::C2bRegisterUrl(p) => RequestBody::C2bRegisterUrl(C2bRegisterUrlBody {
                short_code: &p.short_code,
                response_type: &p.response_type,
                confirmation_url: &p.confirmation_url,
                validation_url: &p.validation_url,
            }),
            Operation::B2b(p) => RequestBody::B2b(B2bBody {
                initiator: &p.initiator_name,
                security_credential: &p.security_credential,
                command_id: &p.command_id,
                sender_identifier_type: &p.sender_identifier_type,
                reciever_identifier_type: &p.receiver_identifier_type,
                amount: p.amount,
                party_a: &p.party_a,
                party_b: &p.party_b,
                account_reference: &p.account_reference,
                remarks: &p.remarks,
                queue_timeout_url: &p.queue_timeout_url,
                result_url: &p.result_url,
            }),
            Operation::Reversal(p) => RequestBody::Reversal(ReversalBody {
                initiator: &p.initiator_name,
                security_credential: &p.security_credential,
                command_id: &p.command_id,
                transaction_id: &p.transaction_id,
                amount: p.amount,
                receiver_party: &p.receiver_party,
                reciever_identifier_type: &p.receiver_identifier_type,
                result_url: &p.result_url,
                queue_timeout_url: &p.queue_timeout_url,
                remarks: &p.remarks,
                occasion: p.occasion.as_deref(),
            }),
            Operation::AccountBalance(p) => RequestBody::AccountBalance(AccountBalanceBody {
                initiator: &p.initiator_name,
                security_credential: &p.security_credential,
                command_id: &p.command_id,
                party_a: &p.party_a,
                identifier_type: &p.identifier_type,
                remarks: &p.remarks,
                queue_timeout_url: &p.queue_timeout_url,
                result_url: &p.result_url,
            }),
        }
    }
}

/// Serialized request body; untagged so each variant renders as its own
/// JSON object.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestBody<'a> {
    StkPush(StkPushBody<'a>),
    B2c(B2cBody<'a>),
    C2bSimulate(C2bSimulateBody<'a>),
    C2bRegisterUrl(C2bRegisterUrlBody<'a>),
    B2b(B2bBody<'a>),
    Reversal(ReversalBody<'a>),
    AccountBalance(AccountBalanceBody<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushBody<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    transaction_type: &'a str,
    amount: u64,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    callback_url: &'a str,
    account_reference: &'a str,
    transaction_desc: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct B2cBody<'a> {
    initiator_name: &'a str,
    security_credential: &'a str,
    #[serde(rename = "CommandID")]
    command_id: &'a str,
    amount: u64,
    party_a: &'a str,
    party_b: &'a str,
    remarks: &'a str,
    #[serde(rename = "QueueTimeOutURL")]
    queue_timeout_url: &'a str,
    #[serde(rename = "ResultURL")]
    result_url: &'a str,
    #[serde(rename = "Occassion", skip_serializing_if = "Option::is_none")]
    occasion: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct C2bSimulateBody<'a> {
    short_code: &'a str,
    #[serde(rename = "CommandID")]
    command_id: &'a str,
    amount: u64,
    msisdn: &'a str,
    bill_ref_number: &'a str,
    timestamp: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct C2bRegisterUrlBody<'a> {
    short_code: &'a str,
    response_type: &'a str,
    #[serde(rename = "ConfirmationURL")]
    confirmation_url: &'a str,
    #[serde(rename = "ValidationURL")]
    validation_url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct B2bBody<'a> {
    initiator: &'a str,
    security_credential: &'a str,
    #[serde(rename = "CommandID")]
    command_id: &'a str,
    sender_identifier_type: &'a str,
    reciever_identifier_type: &'a str,
    amount: u64,
    party_a: &'a str,
    party_b: &'a str,
    account_reference: &'a str,
    remarks: &'a str,
    #[serde(rename = "QueueTimeOutURL")]
    queue_timeout_url: &'a str,
    #[serde(rename = "ResultURL")]
    result_url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReversalBody<'a> {
    initiator: &'a str,
    security_credential: &'a str,
    #[serde(rename = "CommandID")]
    command_id: &'a str,
    #[serde(rename = "TransactionID")]
    transaction_id: &'a str,
    amount: u64,
    receiver_party: &'a str,
    reciever_identifier_type: &'a str,
    #[serde(rename = "ResultURL")]
    result_url: &'a str,
    #[serde(rename = "QueueTimeOutURL")]
    queue_timeout_url: &'a str,
    remarks: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    occasion: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountBalanceBody<'a> {
    initiator: &'a str,
    security_credential: &'a str,
    #[serde(rename = "CommandID")]
    command_id: &'a str,
    party_a: &'a str,
    identifier_type: &'a str,
    remarks: &'a str,
    #[serde(rename = "QueueTimeOutURL")]
    queue_timeout_url: &'a str,
    #[serde(rename = "ResultURL")]
    result_url: &'a str,
}
