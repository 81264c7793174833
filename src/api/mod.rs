pub(crate) mod routes;
pub(crate) mod wire;
