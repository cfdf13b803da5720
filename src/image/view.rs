use super::buffer::Channel;
use super::traits::ImageView;

/// Borrowed view over interleaved 8-bit samples.
#[derive(Clone, Copy, Debug)]
pub struct StripView<'a> {
    pub w: usize,
    pub h: usize,
    pub components: usize,
    pub stride: usize, // samples between rows
    pub data: &'a [u8],
}

impl<'a> StripView<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize, offset: usize) -> u8 {
        self.data[y * self.stride + x * self.components + offset]
    }

    /// Bind a channel, giving single-sample access to the strip.
    pub fn channel(self, channel: Channel) -> ChannelView<'a> {
        ChannelView {
            view: self,
            offset: channel.sample_offset(),
        }
    }
}

impl<'a> ImageView for StripView<'a> {
    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn components(&self) -> usize {
        self.components
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w * self.components]
    }
}

/// Sample accessor: maps `(x, y)` to the selected channel's intensity.
#[derive(Clone, Copy, Debug)]
pub struct ChannelView<'a> {
    view: StripView<'a>,
    offset: usize,
}

impl<'a> ChannelView<'a> {
    #[inline]
    pub fn width(&self) -> usize {
        self.view.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.view.h
    }

    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.view.get(x, y, self.offset)
    }

    /// Samples of column `x` from row `from_y` to the bottom.
    pub fn column(&self, x: usize, from_y: usize) -> impl Iterator<Item = u8> + 'a {
        let view = self.view;
        let offset = self.offset;
        (from_y.min(view.h)..view.h).map(move |y| view.get(x, y, offset))
    }

    /// Samples of row `y` over `[from_x, to_x)`, clamped to the strip width.
    pub fn row_span(&self, y: usize, from_x: usize, to_x: usize) -> impl Iterator<Item = u8> + 'a {
        let view = self.view;
        let offset = self.offset;
        let to_x = to_x.min(view.w);
        (from_x.min(to_x)..to_x).map(move |x| view.get(x, y, offset))
    }
}
