//! Broadcast bus delivering gate events to observers.
//!
//! Publishing never waits for subscribers and succeeds with none attached.

use metatx_types::GateEvent;
use tokio::sync::broadcast;

/// Event bus for broadcasting gate events to any number of subscribers.
///
/// Slow subscribers that fall more than `capacity` events behind observe a
/// lag error and skip ahead.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<GateEvent>,
}

impl EventBus {
	/// Creates a new EventBus with the specified channel capacity.
	///
	/// A capacity of zero is raised to one.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self { sender }
	}

	/// Creates a new subscriber receiving every event published from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event, returning the number of subscribers it reached.
	pub fn publish(&self, event: GateEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use metatx_types::Address;

	fn event() -> GateEvent {
		GateEvent::ApprovalChanged {
			owner: Address::repeat_byte(1),
			operator: Address::repeat_byte(2),
			approved: true,
		}
	}

	#[test]
	fn test_publish_without_subscribers() {
		let bus = EventBus::new(4);
		assert_eq!(bus.publish(event()), 0);
	}

	#[test]
	fn test_zero_capacity_is_raised() {
		let bus = EventBus::new(0);
		let mut rx = bus.subscribe();

		assert_eq!(bus.publish(event()), 1);
		assert_eq!(rx.try_recv().unwrap(), event());
	}

	#[tokio::test]
	async fn test_subscribers_receive_events() {
		let bus = EventBus::new(4);
		let mut first = bus.subscribe();
		let mut second = bus.clone().subscribe();

		assert_eq!(bus.publish(event()), 2);
		assert_eq!(first.recv().await.unwrap(), event());
		assert_eq!(second.recv().await.unwrap(), event());
	}
}
