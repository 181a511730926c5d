// src/app/main_resource.rs

use std::sync::atomic::{AtomicU64, Ordering};

use hotserve::endpoint;

/// Serves `/`, `/hello` and echoes POST bodies back.
#[derive(Debug, Default)]
pub struct MainResource {
    hits: AtomicU64,
}

#[endpoint(path = "/")]
impl MainResource {
    #[get]
    pub fn index(&self) -> String {
        let n = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
        format!("hello-app is up ({n} requests to / so far)\n")
    }

    #[get(path = "hello")]
    pub fn hello(&self) -> &'static str {
        "Hello world!\n"
    }

    #[post]
    pub fn echo(&self, body: String) -> String {
        format!("Got body: {body}")
    }
}
