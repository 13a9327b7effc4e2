use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{router, run, run_with_listener, spawn_with_listener};

mod advance_returns;
mod invoices;
mod parties;
mod receipts;
mod reports;
mod server;
mod transfers;
mod vendor_payments;

pub mod types {
    pub use api_types::AllocationLine;

    pub mod account {
        pub use api_types::account::{AccountKind, AccountNew, AccountView};
    }

    pub mod client {
        pub use api_types::client::{ClientNew, ClientView};
    }

    pub mod vendor {
        pub use api_types::vendor::{BalanceKind, VendorBalanceView, VendorNew, VendorView};
    }

    pub mod invoice {
        pub use api_types::invoice::{
            CostLineNew, InvoiceNew, InvoiceStatus, InvoiceUpdate, InvoiceView, VendorCostView,
        };
    }

    pub mod receipt {
        pub use api_types::receipt::{
            PaymentTo, ReceiptAllocationView, ReceiptNew, ReceiptUpdate, ReceiptView,
        };
    }

    pub mod vendor_payment {
        pub use api_types::vendor_payment::{
            VendorAllocationView, VendorPaymentNew, VendorPaymentTo, VendorPaymentUpdate,
            VendorPaymentView,
        };
    }

    pub mod transfer {
        pub use api_types::transfer::{ChargeBearer, TransferNew, TransferUpdate, TransferView};
    }

    pub mod advance_return {
        pub use api_types::advance_return::{
            AdvanceReturnNew, AdvanceReturnUpdate, AdvanceReturnView, PartyKind,
        };
    }

    pub mod report {
        pub use api_types::report::{
            CollectionLineView, CollectionsView, DateRange, DriftReport, DriftView, LedgerRowView,
            LedgerView, ProfitLossView,
        };
    }

    pub mod voucher {
        pub use api_types::voucher::{Series, VoucherIssued, VoucherNew};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ConcurrentModification(_) => StatusCode::CONFLICT,
        EngineError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_)
        | EngineError::AllocationExceedsDue(_)
        | EngineError::InsufficientBalance(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::StorageUnavailable(detail) => {
            tracing::error!("storage unavailable: {detail}");
            "storage unavailable".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn overpayment_and_overdraft_map_to_422() {
        let res = ServerError::from(EngineError::AllocationExceedsDue("x".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res =
            ServerError::from(EngineError::InsufficientBalance("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ConcurrentModification("x".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_unavailable_maps_to_503() {
        let res =
            ServerError::from(EngineError::StorageUnavailable("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
