use crate::types::FakeReading;

/// Renders the fabricated reading. Calls may repeat; implementations must
/// tolerate showing the same reading more than once.
pub trait DisplaySink: Send + Sync {
    fn show(&self, reading: &FakeReading);
}

impl<F> DisplaySink for F
where
    F: Fn(&FakeReading) + Send + Sync,
{
    fn show(&self, reading: &FakeReading) {
        self(reading)
    }
}
