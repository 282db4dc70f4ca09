#![allow(dead_code)]

pub use timedag_test_utils::builders;
pub use timedag_test_utils::fake_timer;
pub use timedag_test_utils::recording_reporter;
pub use timedag_test_utils::{init_tracing, with_timeout};
