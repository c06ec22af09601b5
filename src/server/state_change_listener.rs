use tokio::sync::watch;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CoordinationSnapshot {
    Unranked,
    Coordinator,
    Electing,
    Follower(String),
    FollowerNoCoordinator,
}

pub(super) fn new(initial_state: CoordinationSnapshot) -> (CoordinationChangeNotifier, CoordinationChangeListener) {
    let (snd, rcv) = watch::channel(initial_state);

    (CoordinationChangeNotifier { snd }, CoordinationChangeListener { rcv })
}

pub(super) struct CoordinationChangeNotifier {
    snd: watch::Sender<CoordinationSnapshot>,
}

impl CoordinationChangeNotifier {
    pub(super) fn notify_new_state(&self, new_state: CoordinationSnapshot) {
        // Only notify on real changes so listeners are not woken by repeated announcements.
        self.snd.send_if_modified(|current| {
            if *current == new_state {
                false
            } else {
                *current = new_state;
                true
            }
        });
    }
}

#[derive(Clone)]
pub(crate) struct CoordinationChangeListener {
    rcv: watch::Receiver<CoordinationSnapshot>,
}

impl CoordinationChangeListener {
    pub(crate) async fn next(&mut self) -> Option<CoordinationSnapshot> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.rcv.borrow().clone()),
            Err(_) => None,
        }
    }

    pub(crate) fn current(&self) -> CoordinationSnapshot {
        self.rcv.borrow().clone()
    }
}
