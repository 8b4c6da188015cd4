/// Viewport dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window: nothing to allocate or draw.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Anything that can serve as one of the three frame targets.
pub trait FrameTarget {
    fn size(&self) -> Size;
}

/// The beam, afterimage and composite images, always the same size.
///
/// Replacement is all-or-nothing: a resize builds a complete new set before
/// any old target is released, so no tick ever sees a missing or mismatched
/// target.
#[derive(Debug)]
pub struct FrameTargets<T> {
    beam: T,
    afterimage: T,
    composite: T,
    size: Size,
}

impl<T: FrameTarget> FrameTargets<T> {
    /// Allocate a full set. If any allocation fails, the ones already made
    /// are handed to `destroy` and the error is returned.
    pub fn new<E>(
        size: Size,
        mut create: impl FnMut(Size) -> Result<T, E>,
        mut destroy: impl FnMut(T),
    ) -> Result<Self, E> {
        let beam = create(size)?;
        let afterimage = match create(size) {
            Ok(t) => t,
            Err(e) => {
                destroy(beam);
                return Err(e);
            }
        };
        let composite = match create(size) {
            Ok(t) => t,
            Err(e) => {
                destroy(beam);
                destroy(afterimage);
                return Err(e);
            }
        };
        debug_assert!([&beam, &afterimage, &composite].iter().all(|t| t.size() == size));
        Ok(Self { beam, afterimage, composite, size })
    }

    /// Swap in a freshly allocated set of `size`, then release the old one.
    /// On failure the current set is left untouched.
    pub fn resize<E>(
        &mut self,
        size: Size,
        create: impl FnMut(Size) -> Result<T, E>,
        mut destroy: impl FnMut(T),
    ) -> Result<(), E> {
        let fresh = Self::new(size, create, &mut destroy)?;
        let old = std::mem::replace(self, fresh);
        old.destroy(destroy);
        Ok(())
    }

    pub fn destroy(self, mut destroy: impl FnMut(T)) {
        destroy(self.beam);
        destroy(self.afterimage);
        destroy(self.composite);
    }
}

impl<T> FrameTargets<T> {
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn beam(&self) -> &T {
        &self.beam
    }

    pub fn afterimage(&self) -> &T {
        &self.afterimage
    }

    pub fn composite(&self) -> &T {
        &self.composite
    }

    /// `(beam, afterimage, composite)`
    pub fn parts_mut(&mut self) -> (&mut T, &mut T, &mut T) {
        (&mut self.beam, &mut self.afterimage, &mut self.composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Fake {
        id: u32,
        size: Size,
    }

    impl FrameTarget for Fake {
        fn size(&self) -> Size {
            self.size
        }
    }

    fn counter() -> impl FnMut(Size) -> Result<Fake, String> {
        let mut next = 0;
        move |size| {
            next += 1;
            Ok(Fake { id: next, size })
        }
    }

    #[test]
    fn test_new_allocates_three_of_one_size() {
        let t = FrameTargets::new(Size::new(4, 3), counter(), |_| {}).unwrap();
        assert_eq!(t.size(), Size::new(4, 3));
        assert_eq!(t.beam().id, 1);
        assert_eq!(t.afterimage().id, 2);
        assert_eq!(t.composite().id, 3);
    }

    #[test]
    fn test_resize_creates_before_destroying() {
        let log = std::cell::RefCell::new(Vec::new());
        let mut t = FrameTargets::new(Size::new(2, 2), counter(), |_| {}).unwrap();

        let mut next = 10;
        t.resize(
            Size::new(8, 6),
            |size| {
                next += 1;
                log.borrow_mut().push(format!("create {next}"));
                Ok::<_, String>(Fake { id: next, size })
            },
            |old| log.borrow_mut().push(format!("destroy {}", old.id)),
        )
        .unwrap();

        assert_eq!(
            log.into_inner(),
            ["create 11", "create 12", "create 13", "destroy 1", "destroy 2", "destroy 3"]
        );
        assert_eq!(t.size(), Size::new(8, 6));
        assert!([t.beam(), t.afterimage(), t.composite()].iter().all(|f| f.size == Size::new(8, 6)));
    }

    #[test]
    fn test_failed_resize_keeps_old_set() {
        let mut t = FrameTargets::new(Size::new(2, 2), counter(), |_| {}).unwrap();
        let mut destroyed = Vec::new();
        let mut calls = 0;
        let result = t.resize(
            Size::new(9, 9),
            |size| {
                calls += 1;
                if calls == 3 {
                    Err("out of memory".to_string())
                } else {
                    Ok(Fake { id: 100 + calls, size })
                }
            },
            |f| destroyed.push(f.id),
        );
        assert_eq!(result, Err("out of memory".to_string()));
        assert_eq!(destroyed, vec![101, 102]);
        assert_eq!(t.size(), Size::new(2, 2));
        assert_eq!(t.beam().id, 1);
    }

    #[test]
    fn test_size_is_empty() {
        assert!(Size::new(0, 10).is_empty());
        assert!(Size::new(10, 0).is_empty());
        assert!(!Size::new(1, 1).is_empty());
    }
}
