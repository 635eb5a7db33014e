// Error codes implementation
// This module contains standardized error codes for Tibb Engine

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
    pub const INVALID_FORMAT: &str = "VALIDATION_1003";
}

pub mod lookup {
    pub const NOT_FOUND: &str = "LOOKUP_2001";
}

pub mod vision {
    pub const ANALYZER_UNAVAILABLE: &str = "VISION_3001";
    pub const UNPARSEABLE_RESPONSE: &str = "VISION_3002";
}

pub mod knowledge {
    pub const EMPTY_KNOWLEDGE: &str = "KNOWLEDGE_4001";
    pub const DUPLICATE_RECORD: &str = "KNOWLEDGE_4002";
}

pub mod feedback {
    pub const DUPLICATE_EVENT: &str = "FEEDBACK_5001";
    pub const RATING_OUT_OF_RANGE: &str = "FEEDBACK_5002";
}

pub mod broadcast {
    pub const TRANSIENT_FAILURE: &str = "BROADCAST_6001";
}

pub mod database {
    pub const CONNECTION_FAILED: &str = "DB_7001";
    pub const QUERY_FAILED: &str = "DB_7002";
    pub const CONSTRAINT_VIOLATION: &str = "DB_7003";
}

pub mod system {
    pub const CONFIG_INVALID: &str = "SYSTEM_8001";
    pub const INTERNAL: &str = "SYSTEM_8002";
}
