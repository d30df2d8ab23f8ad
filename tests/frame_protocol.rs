use std::collections::HashMap;
use ash::prelude::VkResult;
use ash::vk;
use vkswap::renderer::error::{FrameError, SessionEndReason};
use vkswap::renderer::{FrameInfo, FrameTarget, RenderFrameContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Wait(usize),
    Acquire(usize, u32),
    AcquireFailed(usize),
    Reset(usize),
    Record(usize, u32),
    Submit(usize),
    Present(usize, u32),
}

/// Stands in for the device and swapchain. A submission stays pending until
/// its slot's fence is waited on or the device is idled, so the GPU is as
/// far behind as the protocol allows.
struct MockTarget {
    slot_count: usize,
    image_count: u32,
    next_image: u32,

    fence_signaled: Vec<bool>,
    pending: Vec<bool>,
    recorded: Vec<bool>,
    max_in_flight: usize,

    acquires: u64,
    presents: u64,
    acquire_script: HashMap<u64, VkResult<(u32, bool)>>,
    present_script: HashMap<u64, VkResult<bool>>,
    submit_failure: Option<(u64, vk::Result)>,
    submits: u64,

    ops: Vec<Op>,
}

impl MockTarget {
    fn new(slot_count: usize) -> Self {
        Self {
            slot_count,
            image_count: slot_count as u32,
            // Offset so image indices do not line up with slots
            next_image: 1 % slot_count as u32,
            fence_signaled: vec![true; slot_count],
            pending: vec![false; slot_count],
            recorded: vec![false; slot_count],
            max_in_flight: 0,
            acquires: 0,
            presents: 0,
            acquire_script: HashMap::new(),
            present_script: HashMap::new(),
            submit_failure: None,
            submits: 0,
            ops: Vec::new(),
        }
    }

    fn in_flight(&self) -> usize {
        self.pending.iter().filter(|p| **p).count()
    }

    /// Models `vkDeviceWaitIdle` before teardown.
    fn wait_idle(&mut self) {
        for slot in 0..self.slot_count {
            if self.pending[slot] {
                self.pending[slot] = false;
                self.fence_signaled[slot] = true;
            }
        }
    }

    /// Every fence is either signaled or will be signaled by a real submission.
    fn assert_no_orphaned_fence(&self) {
        for slot in 0..self.slot_count {
            assert!(
                self.fence_signaled[slot] || self.pending[slot],
                "fence of slot {} was reset without a submission",
                slot,
            );
        }
    }
}

impl FrameTarget for MockTarget {
    fn slot_count(&self) -> usize {
        self.slot_count
    }

    fn wait_for_slot(&mut self, slot: usize) -> VkResult<()> {
        self.ops.push(Op::Wait(slot));
        if self.pending[slot] {
            self.pending[slot] = false;
            self.fence_signaled[slot] = true;
        }
        assert!(self.fence_signaled[slot], "waiting on fence of slot {} would never return", slot);
        Ok(())
    }

    fn acquire_image(&mut self, slot: usize) -> VkResult<(u32, bool)> {
        let call = self.acquires;
        self.acquires += 1;

        let result = self.acquire_script.remove(&call).unwrap_or_else(|| {
            let image = self.next_image;
            self.next_image = (self.next_image + 1) % self.image_count;
            Ok((image, false))
        });
        match result {
            Ok((image, _)) => self.ops.push(Op::Acquire(slot, image)),
            Err(_) => self.ops.push(Op::AcquireFailed(slot)),
        }
        result
    }

    fn reset_slot(&mut self, slot: usize) -> VkResult<()> {
        self.ops.push(Op::Reset(slot));
        assert!(!self.pending[slot], "slot {} reset while its submission is pending", slot);
        assert!(self.fence_signaled[slot], "slot {} reset before its fence was waited on", slot);
        self.fence_signaled[slot] = false;
        self.recorded[slot] = false;
        Ok(())
    }

    fn record(&mut self, slot: usize, image_index: u32) -> VkResult<()> {
        self.ops.push(Op::Record(slot, image_index));
        assert!(!self.fence_signaled[slot], "slot {} recorded without a reset", slot);
        assert!(image_index < self.image_count);
        self.recorded[slot] = true;
        Ok(())
    }

    fn submit(&mut self, slot: usize) -> VkResult<()> {
        let call = self.submits;
        self.submits += 1;
        self.ops.push(Op::Submit(slot));
        if let Some((at, err)) = self.submit_failure {
            if at == call {
                return Err(err);
            }
        }

        assert!(self.recorded[slot], "slot {} submitted without recording", slot);
        assert!(!self.pending[slot], "slot {} submitted twice", slot);
        self.pending[slot] = true;
        self.max_in_flight = self.max_in_flight.max(self.in_flight());
        Ok(())
    }

    fn present(&mut self, slot: usize, image_index: u32) -> VkResult<bool> {
        let call = self.presents;
        self.presents += 1;
        self.ops.push(Op::Present(slot, image_index));
        self.present_script.remove(&call).unwrap_or(Ok(false))
    }
}

fn run_frames(
    frm: &mut RenderFrameContext,
    target: &mut MockTarget,
    count: usize,
) -> Result<Vec<FrameInfo>, (Vec<FrameInfo>, FrameError)> {
    let mut frames = Vec::new();
    for _ in 0..count {
        match frm.draw_frame(target) {
            Ok(info) => frames.push(info),
            Err(err) => return Err((frames, err)),
        }
    }
    Ok(frames)
}

#[test]
fn frame_steps_run_in_protocol_order() {
    let mut target = MockTarget::new(2);
    let mut frm = RenderFrameContext::new();

    let info = frm.draw_frame(&mut target).unwrap();

    assert_eq!(info, FrameInfo { frame: 0, slot: 0, image_index: 1 });
    assert_eq!(
        target.ops,
        vec![
            Op::Wait(0),
            Op::Acquire(0, 1),
            Op::Reset(0),
            Op::Record(0, 1),
            Op::Submit(0),
            Op::Present(0, 1),
        ],
    );
    assert_eq!(frm.frame_count(), 1);
}

#[test]
fn slots_cycle_round_robin_for_every_image_count() {
    for n in 2..=8 {
        let mut target = MockTarget::new(n);
        let mut frm = RenderFrameContext::new();

        let frames = run_frames(&mut frm, &mut target, 3 * n + 1).unwrap();

        for (i, info) in frames.iter().enumerate() {
            assert_eq!(info.frame, i as u64);
            assert_eq!(info.slot, i % n);
        }
        assert_eq!(target.max_in_flight, n, "in flight with {} slots", n);
        target.wait_idle();
        target.assert_no_orphaned_fence();
    }
}

#[test]
fn recording_uses_acquired_image_not_slot() {
    let mut target = MockTarget::new(3);
    for (call, image) in [2, 2, 0, 1, 0].into_iter().enumerate() {
        target.acquire_script.insert(call as u64, Ok((image, false)));
    }
    let mut frm = RenderFrameContext::new();

    let frames = run_frames(&mut frm, &mut target, 5).unwrap();

    let images = frames.iter().map(|info| info.image_index).collect::<Vec<_>>();
    assert_eq!(images, vec![2, 2, 0, 1, 0]);
    let slots = frames.iter().map(|info| info.slot).collect::<Vec<_>>();
    assert_eq!(slots, vec![0, 1, 2, 0, 1]);

    for pair in target.ops.windows(3) {
        if let [Op::Acquire(slot, image), Op::Reset(_), Op::Record(rec_slot, rec_image)] = pair {
            assert_eq!(slot, rec_slot);
            assert_eq!(image, rec_image);
        }
    }
}

#[test]
fn fence_wait_separates_submissions_of_the_same_slot() {
    let mut target = MockTarget::new(3);
    let mut frm = RenderFrameContext::new();

    run_frames(&mut frm, &mut target, 20).unwrap();

    // Between two submits of a slot that slot is waited on, then reset
    for slot in 0..3 {
        let mut last_submit = None;
        for (i, op) in target.ops.iter().enumerate() {
            if *op == Op::Submit(slot) {
                if let Some(prev) = last_submit {
                    let between = &target.ops[prev + 1..i];
                    let wait = between.iter().position(|op| *op == Op::Wait(slot));
                    let reset = between.iter().position(|op| *op == Op::Reset(slot));
                    assert!(matches!((wait, reset), (Some(w), Some(r)) if w < r));
                }
                last_submit = Some(i);
            }
        }
    }
}

#[test]
fn out_of_date_acquire_on_frame_five_ends_after_frame_four() {
    let mut target = MockTarget::new(3);
    target.acquire_script.insert(4, Err(vk::Result::ERROR_OUT_OF_DATE_KHR));
    let mut frm = RenderFrameContext::new();

    let (frames, err) = run_frames(&mut frm, &mut target, 10).unwrap_err();

    assert_eq!(frames.len(), 4);
    assert!(matches!(err, FrameError::SessionEnd(SessionEndReason::OutOfDate)));
    assert_eq!(frm.frame_count(), 4);

    let last_present = target.ops.iter().rposition(|op| matches!(op, Op::Present(..))).unwrap();
    assert_eq!(&target.ops[last_present + 1..], &[Op::Wait(1), Op::AcquireFailed(1)]);

    target.wait_idle();
    target.assert_no_orphaned_fence();
}

#[test]
fn surface_lost_on_acquire_ends_session() {
    let mut target = MockTarget::new(2);
    target.acquire_script.insert(0, Err(vk::Result::ERROR_SURFACE_LOST_KHR));
    let mut frm = RenderFrameContext::new();

    let err = frm.draw_frame(&mut target).unwrap_err();

    assert!(matches!(err, FrameError::SessionEnd(SessionEndReason::SurfaceLost)));
    assert_eq!(frm.frame_count(), 0);
    target.assert_no_orphaned_fence();
}

#[test]
fn suboptimal_acquire_still_presents_then_ends_session() {
    let mut target = MockTarget::new(2);
    target.acquire_script.insert(1, Ok((0, true)));
    let mut frm = RenderFrameContext::new();

    let (frames, err) = run_frames(&mut frm, &mut target, 5).unwrap_err();

    assert_eq!(frames.len(), 1);
    assert!(matches!(err, FrameError::SessionEnd(SessionEndReason::Suboptimal)));
    assert_eq!(target.ops.last(), Some(&Op::Present(1, 0)));
    assert_eq!(frm.frame_count(), 2);

    target.wait_idle();
    target.assert_no_orphaned_fence();
}

#[test]
fn suboptimal_or_out_of_date_present_ends_session() {
    for (result, reason) in [
        (Ok(true), SessionEndReason::Suboptimal),
        (Err(vk::Result::ERROR_OUT_OF_DATE_KHR), SessionEndReason::OutOfDate),
    ] {
        let mut target = MockTarget::new(2);
        target.present_script.insert(2, result);
        let mut frm = RenderFrameContext::new();

        let (frames, err) = run_frames(&mut frm, &mut target, 5).unwrap_err();

        assert_eq!(frames.len(), 2);
        assert!(matches!(err, FrameError::SessionEnd(r) if r == reason));
        assert_eq!(target.in_flight(), 2);
    }
}

#[test]
fn device_errors_are_fatal() {
    let mut target = MockTarget::new(2);
    target.submit_failure = Some((3, vk::Result::ERROR_DEVICE_LOST));
    let mut frm = RenderFrameContext::new();

    let (frames, err) = run_frames(&mut frm, &mut target, 5).unwrap_err();

    assert_eq!(frames.len(), 3);
    assert!(matches!(err, FrameError::Device(vk::Result::ERROR_DEVICE_LOST)));
    assert!(!err.is_session_end());
    assert_eq!(target.presents, 3);
}

#[test]
fn unexpected_acquire_error_is_fatal() {
    let mut target = MockTarget::new(2);
    target.acquire_script.insert(2, Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY));
    let mut frm = RenderFrameContext::new();

    let (_, err) = run_frames(&mut frm, &mut target, 5).unwrap_err();

    assert!(matches!(err, FrameError::Device(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)));
}
