/// Port for the physical transmission channel. Implementations wrap a
/// serial device or a diagnostic sink; writes are short and bounded.
pub trait RadioChannel: Send + 'static {
    fn send(&mut self, bytes: &[u8]) -> std::io::Result<()>;
    fn close(&mut self);
}
