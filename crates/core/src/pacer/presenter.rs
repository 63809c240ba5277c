/// The render/present side of the loop.
///
/// All calls block the calling thread; `force_gpu_completion` returns only
/// once every submitted GPU command has finished.
pub trait Presenter {
    fn begin_frame(&mut self);

    fn end_frame(&mut self);

    fn present(&mut self);

    fn force_gpu_completion(&mut self);

    /// Period of the presentation deadline in microseconds, or `None` when
    /// presenting is not tied to a refresh.
    fn refresh_period(&self) -> Option<i64>;
}
