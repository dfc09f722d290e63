//! Subscribe/publish sequence run when a session is established.
//!
//! The default plan subscribes to the dex and ball topics, publishes three
//! starters to the pokemon topic, and unsubscribes from the ball topic as soon
//! as its subscription is acknowledged.

use super::correlation::FollowUp;
use super::Qos;

/// Topic subscribed to for the whole session.
pub const DEX_TOPIC: &str = "/pokedex";

/// Topic subscribed to and then dropped once acknowledged.
pub const BALL_TOPIC: &str = "/pokeball";

/// Topic the starters are published to.
pub const POKEMON_TOPIC: &str = "/pokemon";

/// Payloads published to [`POKEMON_TOPIC`].
pub const POKEMON_PAYLOADS: [&str; 3] = ["charmender", "squirtle", "bulbasaur"];

/// A subscription issued on establishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub topic: String,
    pub qos: Qos,
    /// Action to run when this subscription is acknowledged.
    pub follow_up: Option<FollowUp>,
}

/// A message published on establishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
    pub qos: Qos,
    pub retain: bool,
}

/// Ordered actions for a new session. Subscriptions always go out before
/// publications.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionPlan {
    subscriptions: Vec<Subscription>,
    publications: Vec<Publication>,
}

impl SessionPlan {
    /// An empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence the firmware runs.
    pub fn pokemon() -> Self {
        let plan = Self::new().subscribe(DEX_TOPIC, Qos::AtLeastOnce).subscribe_then(
            BALL_TOPIC,
            Qos::AtLeastOnce,
            FollowUp::Unsubscribe(BALL_TOPIC.to_string()),
        );
        POKEMON_PAYLOADS.iter().fold(plan, |plan, payload| {
            plan.publish(POKEMON_TOPIC, *payload, Qos::AtLeastOnce, false)
        })
    }

    pub fn subscribe(self, topic: impl Into<String>, qos: Qos) -> Self {
        self.push_subscription(topic.into(), qos, None)
    }

    /// Subscribe and run `follow_up` when the subscription is acknowledged.
    pub fn subscribe_then(self, topic: impl Into<String>, qos: Qos, follow_up: FollowUp) -> Self {
        self.push_subscription(topic.into(), qos, Some(follow_up))
    }

    pub fn publish(
        mut self,
        topic: impl Into<String>,
        payload: impl Into<String>,
        qos: Qos,
        retain: bool,
    ) -> Self {
        self.publications.push(Publication {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retain,
        });
        self
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    fn push_subscription(mut self, topic: String, qos: Qos, follow_up: Option<FollowUp>) -> Self {
        self.subscriptions.push(Subscription {
            topic,
            qos,
            follow_up,
        });
        self
    }
}
