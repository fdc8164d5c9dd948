//! Behaviour tests for the delivery engine.
//!
//! - `harness.rs`     - scripted mock transport and engine fixture
//! - `ordering.rs`    - strict FIFO delivery, single drain loop
//! - `eviction.rs`    - backoff schedule, retry ceiling, age cutoff
//! - `persistence.rs` - snapshot writes, restore after restart
//! - `response.rs`    - experiment definitions and version header handling
//! - `http.rs`        - `HttpTransport` against a local HTTP/1.1 listener
