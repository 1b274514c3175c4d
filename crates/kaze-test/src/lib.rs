//! In-memory testing for Kaze applications.
//!
//! [`TestClient`] drives a [`Kaze`](kaze_server::Kaze) app through its
//! service without a network listener, and [`TestResponse`] offers chainable
//! assertions on what came back.
//!
//! ```
//! use kaze_core::handler_fn;
//! use kaze_server::Kaze;
//! use kaze_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let mut app = Kaze::new();
//! app.post("/users/:id", [handler_fn(|ctx, _next| {
//!     Box::pin(async move {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         ctx.json(&serde_json::json!({ "id": id }))
//!     })
//! })]);
//!
//! let client = TestClient::new(app);
//! client
//!     .post("/users/7")
//!     .send()
//!     .await
//!     .assert_success()
//!     .assert_json_field("id", &serde_json::json!("7"));
//! # });
//! ```

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
