pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod auth {
    pub mod password;
    pub mod service;
    pub mod token;
    pub mod validation;
}

pub mod handlers {
    pub mod extract;
    pub mod fallback;
    pub mod health;
    pub mod login;
    pub mod me;
    pub mod register;
}

pub mod models {
    pub mod auth;
    pub mod user;
}

pub mod stores {
    pub mod user_store;
}

pub mod wal {
    #[allow(clippy::module_inception)]
    pub mod wal;
}

pub mod utils {
    pub mod time;
}
