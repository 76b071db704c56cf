use crate::strings::StrPos;

#[derive(Debug, Clone, PartialEq)]
pub struct Upstream {
    /// Interned destination address
    pub addr: StrPos,
    pub port: u16,
    /// Interned reverse-resolved name, empty until resolved
    pub name: StrPos,
    /// Freshly discovered, hostname not looked up yet
    pub is_new: bool,
    /// Replies received
    pub responses: u64,
    /// Queries that failed on this upstream
    pub failed: u64,
    /// Running mean of the response time in milliseconds
    pub rtime_ms: f64,
    /// Sample standard deviation of the response time
    pub rtuncertainty_ms: f64,
    /// Welford accumulator behind `rtuncertainty_ms`
    m2: f64,
    pub last_query_ms: u64,
}

impl Upstream {
    pub fn new(addr: StrPos, port: u16) -> Self {
        Self {
            addr,
            port,
            name: StrPos::EMPTY,
            is_new: true,
            responses: 0,
            failed: 0,
            rtime_ms: 0.0,
            rtuncertainty_ms: 0.0,
            m2: 0.0,
            last_query_ms: 0,
        }
    }

    /// Fold one response time into the running mean and uncertainty.
    pub fn record_response(&mut self, rtt_ms: f64, now_ms: u64) {
        self.responses += 1;
        let n = self.responses as f64;
        let delta = rtt_ms - self.rtime_ms;
        self.rtime_ms += delta / n;
        self.m2 += delta * (rtt_ms - self.rtime_ms);
        self.rtuncertainty_ms = if self.responses > 1 {
            (self.m2 / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        self.last_query_ms = now_ms;
    }
}
