pub mod balances;
pub mod constants;
pub mod contract_bindings;
pub mod position;
