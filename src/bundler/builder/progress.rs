//! Progress reporting for packaging runs.

/// Receives status text and counts while files are written.
pub trait Progress {
    /// Names the phase that is starting.
    fn set_title(&mut self, title: &str);

    /// Reports `count` of `total` items processed.
    fn set_count(&mut self, count: usize, total: usize);

    /// Reports the item now being processed.
    fn add_item(&mut self, item: &str);

    /// Reports that `item` is finished.
    fn item_done(&mut self, item: &str);

    /// Reports that the phase is finished.
    fn done(&mut self);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_title(&mut self, _title: &str) {}
    fn set_count(&mut self, _count: usize, _total: usize) {}
    fn add_item(&mut self, _item: &str) {}
    fn item_done(&mut self, _item: &str) {}
    fn done(&mut self) {}
}
