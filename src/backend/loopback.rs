//! In-process loopback simulator

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};

use super::Backend;
use crate::codec;
use crate::types::{BackendId, GroupTag, Sample, VariableGroupDefinition};
use crate::{Result, SimError};

#[derive(Debug, Default)]
struct LoopbackState {
    open: bool,
    disconnected: bool,
    refuse_handshake: bool,
    handshake_delay: Duration,
    latency: Duration,
    failures_pending: u32,
    requests: u64,
    registered: BTreeMap<u32, VariableGroupDefinition>,
    records: HashMap<GroupTag, Vec<u8>>,
    injected: Vec<(GroupTag, Vec<u8>)>,
}

impl LoopbackState {
    fn layout(&self, tag: GroupTag) -> Option<&VariableGroupDefinition> {
        self.registered.values().find(|layout| layout.tag == tag)
    }

    fn check_link(&self, operation: &str) -> Result<()> {
        if self.disconnected {
            return Err(SimError::connection_failed(format!("simulator closed during {operation}")));
        }
        if !self.open {
            return Err(SimError::connection_failed(format!("{operation} on a closed connection")));
        }
        Ok(())
    }

    fn take_failure(&mut self, operation: &str, tag: GroupTag) -> Result<()> {
        if self.failures_pending > 0 {
            self.failures_pending -= 1;
            return Err(SimError::backend_io(format!("{operation} (injected fault)"), Some(tag)));
        }
        Ok(())
    }
}

fn lock(state: &Mutex<LoopbackState>) -> MutexGuard<'_, LoopbackState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A simulator that lives in the current process.
///
/// Requests answer with the last record set or injected for a group (a
/// zeroed record until then), so whatever a replay injects can be recorded
/// back. Faults are injected through a [`LoopbackHandle`], which stays
/// usable after the backend has been handed to a session.
///
/// ```rust
/// use skyreel::backend::{Backend, LoopbackBackend};
/// use skyreel::types::{BackendId, GroupTag};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> skyreel::Result<()> {
/// let mut backend = LoopbackBackend::new(BackendId::Msfs);
/// let handle = backend.handle();
/// backend.open().await?;
///
/// handle.fail_next_requests(1);
/// assert!(backend.request(GroupTag::Light).await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LoopbackBackend {
    id: BackendId,
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackBackend {
    pub fn new(id: BackendId) -> Self {
        Self { id, state: Arc::default() }
    }

    /// Control handle sharing this backend's state.
    pub fn handle(&self) -> LoopbackHandle {
        LoopbackHandle { state: Arc::clone(&self.state) }
    }

    /// Wait out the configured latency without holding the state lock.
    async fn delay(&self) {
        let latency = lock(&self.state).latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait::async_trait]
impl Backend for LoopbackBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    async fn open(&mut self) -> Result<()> {
        let (delay, refuse) = {
            let state = lock(&self.state);
            (state.handshake_delay, state.refuse_handshake)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if refuse {
            return Err(SimError::connection_failed("loopback handshake refused"));
        }

        let mut state = lock(&self.state);
        state.open = true;
        state.disconnected = false;
        debug!("Loopback {} opened", self.id);
        Ok(())
    }

    async fn register(
        &mut self,
        definition_id: u32,
        layout: &VariableGroupDefinition,
    ) -> Result<()> {
        let mut state = lock(&self.state);
        state.check_link("register")?;
        trace!("Loopback registered {} as definition {}", layout.tag, definition_id);
        state.registered.insert(definition_id, layout.clone());
        Ok(())
    }

    async fn request(&mut self, tag: GroupTag) -> Result<Vec<u8>> {
        self.delay().await;

        let mut state = lock(&self.state);
        state.check_link("request")?;
        state.requests += 1;
        state.take_failure("request", tag)?;
        let size = match state.layout(tag) {
            Some(layout) => layout.size(),
            None => return Err(SimError::backend_io("request of unregistered group", Some(tag))),
        };
        Ok(state.records.get(&tag).cloned().unwrap_or_else(|| vec![0; size]))
    }

    async fn send(&mut self, tag: GroupTag, record: &[u8]) -> Result<()> {
        self.delay().await;

        let mut state = lock(&self.state);
        state.check_link("send")?;
        state.take_failure("send", tag)?;
        let size = match state.layout(tag) {
            Some(layout) => layout.size(),
            None => return Err(SimError::backend_io("send to unregistered group", Some(tag))),
        };
        if record.len() != size {
            return Err(SimError::backend_io(
                format!("send ({} bytes, layout declares {})", record.len(), size),
                Some(tag),
            ));
        }
        state.records.insert(tag, record.to_vec());
        state.injected.push((tag, record.to_vec()));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.open {
            debug!("Loopback {} closed", self.id);
        }
        state.open = false;
        state.registered.clear();
        Ok(())
    }
}

/// Test and dry-run control over a [`LoopbackBackend`].
#[derive(Debug, Clone)]
pub struct LoopbackHandle {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackHandle {
    /// Serve `sample` to requests for its group.
    pub fn set_sample(&self, sample: &Sample) {
        lock(&self.state).records.insert(sample.tag(), codec::encode(sample));
    }

    /// Serve raw bytes to requests for `tag`, whatever their length.
    pub fn set_record(&self, tag: GroupTag, record: Vec<u8>) {
        lock(&self.state).records.insert(tag, record);
    }

    /// Fail the next `count` requests and sends with a backend I/O error.
    pub fn fail_next_requests(&self, count: u32) {
        lock(&self.state).failures_pending = count;
    }

    /// Delay every request and send.
    pub fn set_latency(&self, latency: Duration) {
        lock(&self.state).latency = latency;
    }

    pub fn set_handshake_delay(&self, delay: Duration) {
        lock(&self.state).handshake_delay = delay;
    }

    pub fn refuse_handshake(&self, refuse: bool) {
        lock(&self.state).refuse_handshake = refuse;
    }

    /// Simulate the simulator going away.
    pub fn disconnect(&self) {
        lock(&self.state).disconnected = true;
    }

    /// Registered `(definition id, group)` pairs in definition order.
    pub fn registrations(&self) -> Vec<(u32, GroupTag)> {
        lock(&self.state).registered.iter().map(|(id, layout)| (*id, layout.tag)).collect()
    }

    pub fn request_count(&self) -> u64 {
        lock(&self.state).requests
    }

    /// Every record injected so far, in order.
    pub fn injected(&self) -> Vec<(GroupTag, Vec<u8>)> {
        lock(&self.state).injected.clone()
    }

    /// Injected records decoded back into samples.
    pub fn injected_samples(&self) -> Result<Vec<Sample>> {
        self.injected().iter().map(|(tag, bytes)| codec::decode(*tag, bytes)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LightData, LightStates};

    async fn opened() -> (LoopbackBackend, LoopbackHandle) {
        let mut backend = LoopbackBackend::new(BackendId::Msfs);
        let handle = backend.handle();
        backend.open().await.unwrap();
        for tag in GroupTag::ALL {
            backend.register(tag.definition_id(), &codec::layout(tag)).await.unwrap();
        }
        (backend, handle)
    }

    #[tokio::test]
    async fn unset_groups_answer_with_zeroed_records() {
        let (mut backend, _) = opened().await;
        let record = backend.request(GroupTag::AircraftHandle).await.unwrap();
        assert_eq!(record, vec![0; codec::record_size(GroupTag::AircraftHandle)]);
    }

    #[tokio::test]
    async fn injected_records_are_served_back() {
        let (mut backend, handle) = opened().await;
        let sample = Sample::Light(LightData { states: LightStates::STROBE });
        backend.send(GroupTag::Light, &codec::encode(&sample)).await.unwrap();

        let record = backend.request(GroupTag::Light).await.unwrap();
        assert_eq!(codec::decode(GroupTag::Light, &record).unwrap(), sample);
        assert_eq!(handle.injected_samples().unwrap(), vec![sample]);
    }

    #[tokio::test]
    async fn injected_faults_are_consumed() {
        let (mut backend, handle) = opened().await;
        handle.fail_next_requests(2);

        assert!(matches!(
            backend.request(GroupTag::Light).await,
            Err(SimError::BackendIo { group: Some(GroupTag::Light), .. })
        ));
        assert!(backend.send(GroupTag::Light, &[0; 4]).await.is_err());
        assert!(backend.request(GroupTag::Light).await.is_ok());
        assert_eq!(handle.request_count(), 2);
    }

    #[tokio::test]
    async fn wrong_record_size_is_rejected() {
        let (mut backend, _) = opened().await;
        let err = backend.send(GroupTag::Light, &[0; 8]).await.unwrap_err();
        assert!(matches!(err, SimError::BackendIo { .. }));
    }

    #[tokio::test]
    async fn disconnect_surfaces_as_connection_error() {
        let (mut backend, handle) = opened().await;
        handle.disconnect();
        assert!(matches!(
            backend.request(GroupTag::Light).await,
            Err(SimError::Connection { .. })
        ));
    }

    #[tokio::test]
    async fn refused_handshake_keeps_backend_closed() {
        let mut backend = LoopbackBackend::new(BackendId::Msfs);
        backend.handle().refuse_handshake(true);
        assert!(backend.open().await.is_err());
        assert!(matches!(
            backend.register(1, &codec::layout(GroupTag::Light)).await,
            Err(SimError::Connection { .. })
        ));
    }

    #[tokio::test]
    async fn registrations_are_listed_in_definition_order() {
        let (_, handle) = opened().await;
        let registered: Vec<u32> = handle.registrations().into_iter().map(|(id, _)| id).collect();
        assert_eq!(registered, vec![1, 2, 3, 4, 5, 6]);
    }
}
