// SPDX-License-Identifier: MPL-2.0
//! Binds a UI target to at most one outstanding retrieval per channel.
//!
//! An [`ImageBinding`] owns, per [`Channel`], the resource the target should
//! end up showing and a handle to the retrieval currently working on it.
//! Completions that arrive for a resource the channel no longer wants, or
//! after the target has been dropped, are filtered out before they can touch
//! the target; the caller's own completion callback still sees them.
//!
//! # Serialization
//!
//! Each channel's slot lives behind a mutex, and every slot read or write and
//! every target mutation happens while that mutex is held. `request_load`
//! records the new desired resource, applies the placeholder and stores the
//! task handle inside a single critical section, so a completion for an older
//! load can never interleave with a supersession half-way: by the time the
//! completion acquires the lock it either sees the old resource (and applies)
//! or the new one (and is suppressed), regardless of delivery order.
//! Lock order is always slot first, then target.

use crate::image_data::ImageData;
use crate::loader::{CompletionCallback, LoadOutcome, ProgressCallback, ResourceLoader, TaskHandle};
use crate::options::{self, LoadOptions};
use crate::resource::Resource;
use std::sync::{Arc, Mutex, Weak};

/// An independent content slot on a target.
///
/// A target may show two images at once (a button's normal and alternate
/// states, a cell's photo and badge); each is loaded and cancelled on its
/// own, with no shared state between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Primary,
    Alternate,
}

/// A UI object whose visual content this crate may set.
///
/// `set_image(channel, None)` means "show nothing" and is how an absent
/// placeholder is applied.
pub trait ImageTarget {
    fn set_image(&mut self, channel: Channel, image: Option<ImageData>);
}

/// Per-channel load-tracking state.
#[derive(Debug, Default)]
struct ChannelSlot {
    /// The resource the target should end up displaying, or `None` when
    /// nothing is wanted. Written before the loader is invoked, so it is the
    /// staleness baseline for the task about to start.
    desired: Option<Resource>,

    /// Handle to the outstanding retrieval, if any.
    task: Option<TaskHandle>,
}

#[derive(Debug, Default)]
struct SlotTable {
    primary: Mutex<ChannelSlot>,
    alternate: Mutex<ChannelSlot>,
}

impl SlotTable {
    fn slot(&self, channel: Channel) -> &Mutex<ChannelSlot> {
        match channel {
            Channel::Primary => &self.primary,
            Channel::Alternate => &self.alternate,
        }
    }

    fn lock(&self, channel: Channel) -> std::sync::MutexGuard<'_, ChannelSlot> {
        self.slot(channel)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Associates a UI target with its per-channel load slots.
///
/// Holds the target weakly: a pending load never keeps a dropped target
/// alive, and a completion arriving after the drop is forwarded to the
/// caller without touching anything.
pub struct ImageBinding<T: ImageTarget + Send + 'static> {
    target: Weak<Mutex<T>>,
    loader: Arc<dyn ResourceLoader>,
    slots: Arc<SlotTable>,
}

impl<T: ImageTarget + Send + 'static> ImageBinding<T> {
    /// Creates a binding for `target`, delegating retrievals to `loader`.
    #[must_use]
    pub fn new(target: &Arc<Mutex<T>>, loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            target: Arc::downgrade(target),
            loader,
            slots: Arc::new(SlotTable::default()),
        }
    }

    /// Requests that `channel` end up showing `resource`.
    ///
    /// With `resource` absent this is the synchronous "load nothing" path:
    /// the placeholder is applied, the channel's desired resource and task
    /// are cleared (the prior task is asked to cancel), `on_complete` runs
    /// before this returns with the empty outcome, and the returned handle
    /// is inert.
    ///
    /// Otherwise the prior task for the channel is asked to cancel, the
    /// placeholder is applied unless `keep_current_while_loading` is set,
    /// and the loader is invoked with `options` merged over the process-wide
    /// defaults. `on_progress` only sees events while its load is still the
    /// one the channel wants; `on_complete` always fires, but the target is
    /// only mutated when the completed load is still wanted and the target
    /// is still alive.
    pub fn request_load(
        &self,
        channel: Channel,
        resource: Option<Resource>,
        placeholder: Option<ImageData>,
        load_options: LoadOptions,
        mut on_progress: Option<ProgressCallback>,
        on_complete: Option<CompletionCallback>,
    ) -> TaskHandle {
        let Some(resource) = resource else {
            let mut slot = self.slots.lock(channel);
            if let Some(task) = slot.task.take() {
                task.cancel();
            }
            slot.desired = None;
            self.apply_to_target(channel, placeholder);
            drop(slot);

            if let Some(on_complete) = on_complete {
                on_complete(LoadOutcome::empty());
            }
            return TaskHandle::empty();
        };

        let effective = load_options.merged_with(&options::default_options());

        let mut slot = self.slots.lock(channel);
        if let Some(prior) = slot.task.take() {
            prior.cancel();
        }
        if !effective.keep_current() {
            self.apply_to_target(channel, placeholder);
        }
        slot.desired = Some(resource.clone());

        let progress_url = resource.url().to_string();
        let progress_slots = Arc::clone(&self.slots);
        let wrapped_progress: ProgressCallback = Box::new(move |received, total| {
            let still_wanted = progress_slots
                .lock(channel)
                .desired
                .as_ref()
                .is_some_and(|wanted| wanted.url() == progress_url);
            if !still_wanted {
                log::trace!("dropping progress for superseded load of {progress_url}");
                return;
            }
            if let Some(on_progress) = on_progress.as_mut() {
                on_progress(received, total);
            }
        });

        let completion_url = resource.url().to_string();
        let completion_slots = Arc::clone(&self.slots);
        let completion_target = Weak::clone(&self.target);
        let wrapped_complete: CompletionCallback = Box::new(move |outcome: LoadOutcome| {
            let mut slot = completion_slots.lock(channel);
            let still_wanted = slot
                .desired
                .as_ref()
                .is_some_and(|wanted| Some(wanted.url()) == delivered_url(&outcome));
            let target = completion_target.upgrade();

            match (still_wanted, target) {
                (true, Some(target)) => {
                    slot.task = None;
                    if let Some(image) = outcome.image.clone() {
                        target
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .set_image(channel, Some(image));
                    }
                }
                (false, _) => {
                    log::debug!("suppressing superseded completion for {completion_url}");
                }
                (_, None) => {
                    log::debug!("suppressing completion for dropped target ({completion_url})");
                }
            }
            drop(slot);

            if let Some(on_complete) = on_complete {
                on_complete(outcome);
            }
        });

        // Still inside the critical section: the loader must not call back
        // re-entrantly, so the handle is stored before any callback can run.
        let task = self
            .loader
            .retrieve(resource, effective, wrapped_progress, wrapped_complete);
        slot.task = Some(task.clone());
        task
    }

    /// Requests cancellation of the channel's outstanding retrieval, if any.
    ///
    /// Advisory and non-blocking: a retrieval already past its cancellation
    /// checks still delivers a completion, which is then judged purely by the
    /// staleness rule. The desired resource is deliberately left in place, so
    /// such a completion still applies.
    pub fn cancel_load(&self, channel: Channel) {
        let slot = self.slots.lock(channel);
        if let Some(task) = &slot.task {
            task.cancel();
        }
    }

    /// The resource currently bound to `channel`, if any.
    #[must_use]
    pub fn bound_resource(&self, channel: Channel) -> Option<Resource> {
        self.slots.lock(channel).desired.clone()
    }

    /// Whether `channel` has an outstanding retrieval.
    #[must_use]
    pub fn has_active_task(&self, channel: Channel) -> bool {
        self.slots.lock(channel).task.is_some()
    }

    fn apply_to_target(&self, channel: Channel, image: Option<ImageData>) {
        if let Some(target) = self.target.upgrade() {
            target
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .set_image(channel, image);
        }
    }
}

impl<T: ImageTarget + Send + 'static> std::fmt::Debug for ImageBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBinding")
            .field("target_alive", &(self.target.strong_count() > 0))
            .field("primary", &self.slots.lock(Channel::Primary))
            .field("alternate", &self.slots.lock(Channel::Alternate))
            .finish()
    }
}

fn delivered_url(outcome: &LoadOutcome) -> Option<&str> {
    outcome.resource.as_ref().map(Resource::url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::CacheOrigin;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeTarget {
        images: Vec<(Channel, Option<ImageData>)>,
    }

    impl ImageTarget for FakeTarget {
        fn set_image(&mut self, channel: Channel, image: Option<ImageData>) {
            self.images.push((channel, image));
        }
    }

    /// Loader that parks every retrieval until the test drives it.
    #[derive(Default)]
    struct ManualLoader {
        pending: StdMutex<Vec<(Resource, ProgressCallback, CompletionCallback, TaskHandle)>>,
    }

    impl ManualLoader {
        fn complete(&self, index: usize, outcome: LoadOutcome) {
            let (_, _, on_complete, _) = self.pending.lock().unwrap().remove(index);
            on_complete(outcome);
        }

        fn progress(&self, index: usize, received: u64, total: u64) {
            let mut pending = self.pending.lock().unwrap();
            let (_, on_progress, _, _) = &mut pending[index];
            on_progress(received, total);
        }

        fn handle(&self, index: usize) -> TaskHandle {
            self.pending.lock().unwrap()[index].3.clone()
        }

        fn pending_count(&self) -> usize {
            self.pending.lock().unwrap().len()
        }
    }

    impl ResourceLoader for ManualLoader {
        fn retrieve(
            &self,
            resource: Resource,
            _options: LoadOptions,
            on_progress: ProgressCallback,
            on_complete: CompletionCallback,
        ) -> TaskHandle {
            let handle = TaskHandle::new();
            self.pending.lock().unwrap().push((
                resource,
                on_progress,
                on_complete,
                handle.clone(),
            ));
            handle
        }
    }

    fn pixel(value: u8) -> ImageData {
        ImageData::from_rgba(1, 1, vec![value; 4])
    }

    fn setup() -> (Arc<Mutex<FakeTarget>>, Arc<ManualLoader>, ImageBinding<FakeTarget>) {
        let target = Arc::new(Mutex::new(FakeTarget::default()));
        let loader = Arc::new(ManualLoader::default());
        let binding = ImageBinding::new(&target, Arc::clone(&loader) as Arc<dyn ResourceLoader>);
        (target, loader, binding)
    }

    #[test]
    fn absent_resource_is_synchronous() {
        let (target, loader, binding) = setup();
        let completions = Arc::new(StdMutex::new(Vec::new()));
        let seen = Arc::clone(&completions);

        let handle = binding.request_load(
            Channel::Primary,
            None,
            Some(pixel(9)),
            LoadOptions::default(),
            None,
            Some(Box::new(move |outcome| seen.lock().unwrap().push(outcome))),
        );

        // Completion already delivered, nothing asynchronous started.
        assert_eq!(loader.pending_count(), 0);
        assert!(!handle.is_cancel_requested());
        assert!(binding.bound_resource(Channel::Primary).is_none());

        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert!(completions[0].image.is_none());
        assert!(completions[0].error.is_none());
        assert_eq!(completions[0].cache_origin, CacheOrigin::None);
        assert!(completions[0].resource.is_none());

        let target = target.lock().unwrap();
        assert_eq!(target.images.len(), 1);
        assert_eq!(target.images[0].1, Some(pixel(9)));
    }

    #[test]
    fn successful_load_applies_and_clears_task() {
        let (target, loader, binding) = setup();
        let resource = Resource::new("https://example.com/a.png");

        binding.request_load(
            Channel::Primary,
            Some(resource.clone()),
            None,
            LoadOptions::default(),
            None,
            None,
        );
        assert!(binding.has_active_task(Channel::Primary));

        loader.complete(
            0,
            LoadOutcome::success(pixel(1), CacheOrigin::None, resource.clone()),
        );

        assert!(!binding.has_active_task(Channel::Primary));
        assert_eq!(binding.bound_resource(Channel::Primary), Some(resource));
        let target = target.lock().unwrap();
        // Placeholder (None) first, then the loaded image.
        assert_eq!(target.images.last().unwrap().1, Some(pixel(1)));
    }

    #[test]
    fn superseding_request_cancels_prior_task() {
        let (_target, loader, binding) = setup();

        binding.request_load(
            Channel::Primary,
            Some(Resource::new("https://example.com/a.png")),
            None,
            LoadOptions::default(),
            None,
            None,
        );
        let first = loader.handle(0);
        assert!(!first.is_cancel_requested());

        binding.request_load(
            Channel::Primary,
            Some(Resource::new("https://example.com/b.png")),
            None,
            LoadOptions::default(),
            None,
            None,
        );
        assert!(first.is_cancel_requested());
    }

    #[test]
    fn superseded_completion_forwards_without_applying() {
        let (target, loader, binding) = setup();
        let a = Resource::new("https://example.com/a.png");
        let b = Resource::new("https://example.com/b.png");

        let a_outcomes = Arc::new(StdMutex::new(Vec::new()));
        let seen = Arc::clone(&a_outcomes);
        binding.request_load(
            Channel::Primary,
            Some(a.clone()),
            None,
            LoadOptions::default(),
            None,
            Some(Box::new(move |outcome| seen.lock().unwrap().push(outcome))),
        );
        binding.request_load(
            Channel::Primary,
            Some(b.clone()),
            None,
            LoadOptions::default(),
            None,
            None,
        );

        // A completes late, out of order.
        loader.complete(0, LoadOutcome::success(pixel(1), CacheOrigin::None, a));

        // Caller observed it, target did not.
        assert_eq!(a_outcomes.lock().unwrap().len(), 1);
        assert!(target
            .lock()
            .unwrap()
            .images
            .iter()
            .all(|(_, image)| image.is_none()));

        // B still wins.
        loader.complete(0, LoadOutcome::success(pixel(2), CacheOrigin::None, b.clone()));
        assert_eq!(
            target.lock().unwrap().images.last().unwrap().1,
            Some(pixel(2))
        );
        assert_eq!(binding.bound_resource(Channel::Primary), Some(b));
    }

    #[test]
    fn superseded_progress_is_dropped() {
        let (_target, loader, binding) = setup();
        let events = Arc::new(StdMutex::new(Vec::new()));
        let seen = Arc::clone(&events);

        binding.request_load(
            Channel::Primary,
            Some(Resource::new("https://example.com/a.png")),
            None,
            LoadOptions::default(),
            Some(Box::new(move |received, total| {
                seen.lock().unwrap().push((received, total));
            })),
            None,
        );

        loader.progress(0, 10, 100);
        assert_eq!(events.lock().unwrap().len(), 1);

        binding.request_load(
            Channel::Primary,
            Some(Resource::new("https://example.com/b.png")),
            None,
            LoadOptions::default(),
            None,
            None,
        );

        // Still in flight, but no longer wanted.
        loader.progress(0, 50, 100);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn cancel_without_task_is_noop() {
        let (_target, _loader, binding) = setup();
        binding.cancel_load(Channel::Primary);
        assert!(binding.bound_resource(Channel::Primary).is_none());
        assert!(!binding.has_active_task(Channel::Primary));
    }

    #[test]
    fn cancelled_but_delivered_completion_still_applies() {
        let (target, loader, binding) = setup();
        let resource = Resource::new("https://example.com/a.png");

        binding.request_load(
            Channel::Primary,
            Some(resource.clone()),
            None,
            LoadOptions::default(),
            None,
            None,
        );
        binding.cancel_load(Channel::Primary);
        assert!(loader.handle(0).is_cancel_requested());
        // Cancellation clears nothing.
        assert_eq!(
            binding.bound_resource(Channel::Primary),
            Some(resource.clone())
        );

        // The loader was past the point of no return and delivers anyway.
        loader.complete(0, LoadOutcome::success(pixel(3), CacheOrigin::None, resource));
        assert_eq!(
            target.lock().unwrap().images.last().unwrap().1,
            Some(pixel(3))
        );
    }

    #[test]
    fn dropped_target_suppresses_apply_but_forwards() {
        let (target, loader, binding) = setup();
        let resource = Resource::new("https://example.com/a.png");
        let outcomes = Arc::new(StdMutex::new(Vec::new()));
        let seen = Arc::clone(&outcomes);

        binding.request_load(
            Channel::Primary,
            Some(resource.clone()),
            None,
            LoadOptions::default(),
            None,
            Some(Box::new(move |outcome| seen.lock().unwrap().push(outcome))),
        );
        drop(target);

        loader.complete(0, LoadOutcome::success(pixel(4), CacheOrigin::None, resource));
        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].image, Some(pixel(4)));
    }

    #[test]
    fn channels_are_independent() {
        let (target, loader, binding) = setup();
        let a = Resource::new("https://example.com/primary.png");
        let b = Resource::new("https://example.com/alternate.png");

        binding.request_load(
            Channel::Primary,
            Some(a.clone()),
            None,
            LoadOptions::default(),
            None,
            None,
        );
        binding.request_load(
            Channel::Alternate,
            Some(b.clone()),
            None,
            LoadOptions::default(),
            None,
            None,
        );

        // Cancelling the alternate channel leaves the primary task alone.
        binding.cancel_load(Channel::Alternate);
        assert!(!loader.handle(0).is_cancel_requested());
        assert!(loader.handle(1).is_cancel_requested());

        loader.complete(0, LoadOutcome::success(pixel(1), CacheOrigin::None, a.clone()));
        assert_eq!(binding.bound_resource(Channel::Primary), Some(a));
        assert_eq!(binding.bound_resource(Channel::Alternate), Some(b));
        assert!(binding.has_active_task(Channel::Alternate));
        assert!(!binding.has_active_task(Channel::Primary));

        let applied = target.lock().unwrap();
        let primary_applies: Vec<_> = applied
            .images
            .iter()
            .filter(|(c, image)| *c == Channel::Primary && image.is_some())
            .collect();
        assert_eq!(primary_applies.len(), 1);
    }

    #[test]
    fn keep_current_skips_placeholder() {
        let (target, _loader, binding) = setup();
        binding.request_load(
            Channel::Primary,
            Some(Resource::new("https://example.com/a.png")),
            Some(pixel(9)),
            LoadOptions {
                keep_current_while_loading: Some(true),
                ..Default::default()
            },
            None,
            None,
        );
        assert!(target.lock().unwrap().images.is_empty());
    }

    #[test]
    fn failure_outcome_is_forwarded_and_leaves_target_untouched() {
        let (target, loader, binding) = setup();
        let resource = Resource::new("https://example.com/a.png");
        let outcomes = Arc::new(StdMutex::new(Vec::new()));
        let seen = Arc::clone(&outcomes);

        binding.request_load(
            Channel::Primary,
            Some(resource.clone()),
            None,
            LoadOptions::default(),
            None,
            Some(Box::new(move |outcome| seen.lock().unwrap().push(outcome))),
        );
        loader.complete(
            0,
            LoadOutcome::failure(crate::error::LoadError::Http { code: 404 }, resource),
        );

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(
            outcomes[0].error,
            Some(crate::error::LoadError::Http { code: 404 })
        );
        // Only the placeholder write, no image applied.
        assert!(target
            .lock()
            .unwrap()
            .images
            .iter()
            .all(|(_, image)| image.is_none()));
        // Delivery for the still-desired resource clears the task either way.
        assert!(!binding.has_active_task(Channel::Primary));
    }
}
