mod api_server;

pub use api_server::{
    client_address, router, ApiError, ApiServer, ApiState, HealthResponse, LookupResponse,
};
