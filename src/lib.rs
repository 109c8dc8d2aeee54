pub mod service {
    pub mod config_service;
}

pub mod config {
    pub mod config;
    pub mod ports;
}

pub mod action {
    pub mod cli;
    pub mod interactive;
    pub mod presenter;
}

pub mod models {
    pub mod conversion;
    pub mod event;
}

pub mod backend {
    pub mod automation;
    pub mod bridge;
    pub mod process;
    pub mod traits {
        pub mod i_backend;
    }
}

pub mod facade {
    pub mod conversion_facade;
    pub mod worker;
    pub mod traits {
        pub mod i_conversion;
    }
}

pub mod utils {
    pub mod discovery;
    pub mod path_mapper;
    pub mod utils;
}

pub mod error;
