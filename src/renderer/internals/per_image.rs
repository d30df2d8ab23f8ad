/// One color view, one framebuffer and one frame slot per presentable image.
///
/// Entries are pushed as soon as they exist, so when `fill` stops at a failure
/// everything created before it is still here for the owner to release.
pub struct PerImage<V, F, S> {
    pub views: Vec<V>,
    pub framebuffers: Vec<F>,
    pub slots: Vec<S>,
}

impl<V, F, S> PerImage<V, F, S> {
    pub fn new() -> Self {
        Self {
            views: Vec::new(),
            framebuffers: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn fill<I: Copy, E>(
        &mut self,
        images: &[I],
        mut create_view: impl FnMut(I) -> Result<V, E>,
        mut create_framebuffer: impl FnMut(&V) -> Result<F, E>,
        mut create_slot: impl FnMut() -> Result<S, E>,
    ) -> Result<(), E> {
        for &image in images {
            let view = create_view(image)?;
            let framebuffer = create_framebuffer(&view);
            self.views.push(view);
            self.framebuffers.push(framebuffer?);
            self.slots.push(create_slot()?);
        }
        debug_assert_eq!(self.counts(), (images.len(), images.len(), images.len()));
        Ok(())
    }

    /// Number of views, framebuffers and slots.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.views.len(), self.framebuffers.len(), self.slots.len())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

impl<V, F, S> Default for PerImage<V, F, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Slot(usize);

    #[test]
    fn one_of_each_per_image() {
        for n in 2..=8 {
            let images = (0..n as u64).collect::<Vec<_>>();
            let mut per_image = PerImage::new();
            let mut next_slot = 0;

            per_image.fill(
                &images,
                |image| Ok::<_, ()>(image * 10),
                |view| Ok(*view + 1),
                || {
                    next_slot += 1;
                    Ok(Slot(next_slot - 1))
                },
            ).unwrap();

            assert_eq!(per_image.counts(), (n, n, n));
            assert_eq!(per_image.len(), n);
            assert_eq!(per_image.framebuffers[n - 1], (n as u64 - 1) * 10 + 1);
            assert_eq!(per_image.slots[n - 1], Slot(n - 1));
        }
    }

    #[test]
    fn failure_keeps_what_was_created() {
        let images = [0u32, 1, 2, 3];
        let mut per_image = PerImage::new();
        let mut slots = 0;

        let result = per_image.fill(
            &images,
            Ok,
            |view| Ok(*view),
            || {
                slots += 1;
                if slots == 3 { Err("out of memory") } else { Ok(Slot(slots)) }
            },
        );

        assert_eq!(result, Err("out of memory"));
        assert_eq!(per_image.counts(), (3, 3, 2));
    }

    #[test]
    fn failed_framebuffer_keeps_its_view() {
        let images = [7u32, 8];
        let mut per_image: PerImage<u32, u32, Slot> = PerImage::new();

        let result = per_image.fill(
            &images,
            Ok,
            |view| if *view == 8 { Err(()) } else { Ok(*view) },
            || Ok(Slot(0)),
        );

        assert!(result.is_err());
        assert_eq!(per_image.views, vec![7, 8]);
        assert_eq!(per_image.counts(), (2, 1, 1));
    }
}
