pub mod user {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
    #[cfg(test)]
    pub mod testing;
}

pub mod document {
    pub mod access;
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
    #[cfg(test)]
    pub mod testing;
}

pub mod storage;
pub mod websocket;
