/// Row-major access to interleaved 8-bit samples.
///
/// `row(y)` returns `width() * components()` samples; `stride()` counts
/// samples between the starts of consecutive rows.
pub trait ImageView {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn components(&self) -> usize;
    fn stride(&self) -> usize;

    fn row(&self, y: usize) -> &[u8];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { image: self, y: 0 }
    }
}

pub struct Rows<'a, I: ?Sized + ImageView> {
    image: &'a I,
    y: usize,
}

impl<'a, I: ImageView> Iterator for Rows<'a, I> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.image.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.image.row(y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.image.height().saturating_sub(self.y);
        (left, Some(left))
    }
}
