use errand_order::OrderService;
use errand_shared::Masked;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub auth: AuthConfig,
}
