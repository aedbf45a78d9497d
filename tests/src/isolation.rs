use std::sync::atomic::{AtomicU32, Ordering};

/// Names a database namespace unique to one test.
///
/// The name has the form `test_{process_id}_{test_counter}`, so tests running
/// in parallel, within or across processes, never share tables.
#[derive(Clone)]
#[allow(dead_code)] // Only used when the postgresql feature is enabled
pub struct TestIsolation {
    process_id: u32,
    test_counter: u32,
}

#[allow(dead_code)]
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

#[allow(dead_code)]
impl TestIsolation {
    pub fn new() -> Self {
        Self {
            process_id: std::process::id(),
            test_counter: TEST_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn schema_name(&self) -> String {
        format!("test_{}_{}", self.process_id, self.test_counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_are_unique() {
        let a = TestIsolation::new();
        let b = TestIsolation::new();
        assert_ne!(a.schema_name(), b.schema_name());
        assert!(a.schema_name().starts_with("test_"));
    }
}
