use opentelemetry::{
    KeyValue,
    metrics::{Counter, Meter},
};

pub struct GateMetrics {
    open: Counter<u64>,
    handshakes: Counter<u64>,
    status: Counter<u64>,
    pings: Counter<u64>,
    kicks: Counter<u64>,
    failures: Counter<u64>,
}

impl GateMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            open: meter.u64_counter("kickstand_socket_open_total").build(),
            handshakes: meter.u64_counter("kickstand_handshake_total").build(),
            status: meter.u64_counter("kickstand_status_total").build(),
            pings: meter.u64_counter("kickstand_ping_total").build(),
            kicks: meter.u64_counter("kickstand_login_kick_total").build(),
            failures: meter.u64_counter("kickstand_session_fail_total").build(),
        }
    }

    pub fn record_open(&self) {
        self.open.add(1, &[]);
    }

    pub fn record_handshake(&self, next_state: &'static str) {
        self.handshakes
            .add(1, &[KeyValue::new("state", next_state)]);
    }

    pub fn record_status(&self) {
        self.status.add(1, &[]);
    }

    pub fn record_ping(&self) {
        self.pings.add(1, &[]);
    }

    pub fn record_kick(&self) {
        self.kicks.add(1, &[]);
    }

    pub fn record_failure(&self, kind: &'static str) {
        self.failures.add(1, &[KeyValue::new("kind", kind)]);
    }
}
