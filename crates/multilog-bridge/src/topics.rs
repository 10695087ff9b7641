use std::collections::HashMap;

use multilog_frame::FIRST_BRIDGED_PORT;
use serde::Serialize;

/// Topics of one port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortTopics {
    /// Inbound configuration commands.
    pub cfg: String,
    /// Outbound framed serial data.
    pub rx: String,
    /// Inbound data to transmit; also the transmit echo.
    pub tx: String,
}

/// What an inbound topic addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Control,
    Config(usize),
    Transmit(usize),
}

/// Every topic name of a device, built once at startup.
///
/// Topics are rooted at the device identifier: `/<uuid>/control/in`,
/// `/<uuid>/uart/<port>/cfg` and so on. Port topics exist for every index,
/// the console included, but only bridged ports are subscribed.
#[derive(Debug, Clone)]
pub struct TopicSet {
    control_in: String,
    control_out: String,
    status: String,
    ports: Vec<PortTopics>,
    routes: HashMap<String, Route>,
}

impl TopicSet {
    pub fn new(uuid: &str, port_count: usize) -> Self {
        let control_in = format!("/{uuid}/control/in");
        let control_out = format!("/{uuid}/control/out");
        let status = format!("/{uuid}/status/uart");
        let ports: Vec<PortTopics> = (0..port_count)
            .map(|port| PortTopics {
                cfg: format!("/{uuid}/uart/{port}/cfg"),
                rx: format!("/{uuid}/uart/{port}/rx"),
                tx: format!("/{uuid}/uart/{port}/tx"),
            })
            .collect();

        let mut routes = HashMap::with_capacity(1 + 2 * port_count);
        routes.insert(control_in.clone(), Route::Control);
        for (port, topics) in ports.iter().enumerate() {
            routes.insert(topics.cfg.clone(), Route::Config(port));
            routes.insert(topics.tx.clone(), Route::Transmit(port));
        }

        Self {
            control_in,
            control_out,
            status,
            ports,
            routes,
        }
    }

    pub fn control_in(&self) -> &str {
        &self.control_in
    }

    pub fn control_out(&self) -> &str {
        &self.control_out
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Topics of `port`, console included.
    pub fn port(&self, port: usize) -> Option<&PortTopics> {
        self.ports.get(port)
    }

    /// Number of ports the set was built for.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Classify an inbound topic. Exact match only; anything else is `None`.
    pub fn route(&self, topic: &str) -> Option<Route> {
        self.routes.get(topic).copied()
    }

    /// Topics to subscribe once connected: the control input, then the
    /// configuration and transmit topics of each bridged port.
    pub fn subscriptions(&self) -> impl Iterator<Item = &str> + '_ {
        let bridged = self.ports.iter().skip(FIRST_BRIDGED_PORT);
        std::iter::once(self.control_in.as_str()).chain(
            bridged.flat_map(|topics| [topics.cfg.as_str(), topics.tx.as_str()]),
        )
    }
}
