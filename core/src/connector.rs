use std::fmt;

pub const CONNECTOR_KIND_COUNT: usize = 4;

// Geometry multipliers are relative to the cell size; see export.rs for the
// absolute base dimensions they scale.
pub const KNOB_PROFILE: ConnectorProfile = ConnectorProfile {
    width_ratio: 1.00,
    depth_ratio: 0.90,
    neck_ratio: 0.55,
    style: ConnectorStyle::Rounded,
};
pub const SPADE_PROFILE: ConnectorProfile = ConnectorProfile {
    width_ratio: 0.85,
    depth_ratio: 1.10,
    neck_ratio: 0.40,
    style: ConnectorStyle::Angular,
};
pub const BULB_PROFILE: ConnectorProfile = ConnectorProfile {
    width_ratio: 1.25,
    depth_ratio: 0.75,
    neck_ratio: 0.70,
    style: ConnectorStyle::Rounded,
};
pub const WEDGE_PROFILE: ConnectorProfile = ConnectorProfile {
    width_ratio: 0.70,
    depth_ratio: 1.30,
    neck_ratio: 0.30,
    style: ConnectorStyle::Angular,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectorStyle {
    Rounded,
    Angular,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectorProfile {
    pub width_ratio: f32,
    pub depth_ratio: f32,
    pub neck_ratio: f32,
    pub style: ConnectorStyle,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Knob,
    Spade,
    Bulb,
    Wedge,
}

pub const CONNECTOR_KINDS: [ConnectorKind; CONNECTOR_KIND_COUNT] = [
    ConnectorKind::Knob,
    ConnectorKind::Spade,
    ConnectorKind::Bulb,
    ConnectorKind::Wedge,
];

impl ConnectorKind {
    pub fn profile(self) -> ConnectorProfile {
        match self {
            ConnectorKind::Knob => KNOB_PROFILE,
            ConnectorKind::Spade => SPADE_PROFILE,
            ConnectorKind::Bulb => BULB_PROFILE,
            ConnectorKind::Wedge => WEDGE_PROFILE,
        }
    }

    pub fn code(self) -> char {
        match self {
            ConnectorKind::Knob => 'k',
            ConnectorKind::Spade => 's',
            ConnectorKind::Bulb => 'b',
            ConnectorKind::Wedge => 'w',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'k' => Some(ConnectorKind::Knob),
            's' => Some(ConnectorKind::Spade),
            'b' => Some(ConnectorKind::Bulb),
            'w' => Some(ConnectorKind::Wedge),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectorKind::Knob => "knob",
            ConnectorKind::Spade => "spade",
            ConnectorKind::Bulb => "bulb",
            ConnectorKind::Wedge => "wedge",
        };
        f.write_str(label)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Protruding,
    Recessed,
}

impl Polarity {
    pub fn opposite(self) -> Self {
        match self {
            Polarity::Protruding => Polarity::Recessed,
            Polarity::Recessed => Polarity::Protruding,
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            Polarity::Protruding => 1,
            Polarity::Recessed => -1,
        }
    }

    pub fn code(self) -> char {
        match self {
            Polarity::Protruding => 'p',
            Polarity::Recessed => 'r',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'p' => Some(Polarity::Protruding),
            'r' => Some(Polarity::Recessed),
            _ => None,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct Connector {
    pub kind: ConnectorKind,
    pub polarity: Polarity,
}

impl Connector {
    pub fn new(kind: ConnectorKind, polarity: Polarity) -> Self {
        Self { kind, polarity }
    }

    pub fn mate(self) -> Self {
        Self {
            kind: self.kind,
            polarity: self.polarity.opposite(),
        }
    }
}

pub fn can_connect(a: Connector, b: Connector) -> bool {
    a.kind == b.kind && a.polarity != b.polarity
}
