pub mod controllers {
    pub mod dialogue;
    pub mod health;
}

pub mod domain {
    pub mod dialogue;
}

pub mod error;

pub mod infrastructure {
    pub mod audio;
    pub mod config;
    pub mod http;
    pub mod repositories;
    pub mod storage;
}
