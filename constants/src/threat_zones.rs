use crate::render_settings::Rgba;

/// A shaded world-space region drawn beneath the markers.
pub struct ThreatZoneDef {
    pub name: &'static str,
    pub color: Rgba,
    pub polygon: &'static [(f64, f64)],
}

pub const THREAT_ZONES: &[ThreatZoneDef] = &[
    ThreatZoneDef {
        name: "Safe Zone (1-10)",
        color: [0, 180, 0, 8],
        polygon: &[
            (-135168.0, 114688.0),
            (-135168.0, 20000.0),
            (-60000.0, 20000.0),
            (-60000.0, 60000.0),
            (-20000.0, 60000.0),
            (-20000.0, 114688.0),
        ],
    },
    ThreatZoneDef {
        name: "Low Risk (5-15)",
        color: [120, 200, 0, 8],
        polygon: &[
            (-20000.0, 114688.0),
            (-20000.0, 60000.0),
            (40000.0, 60000.0),
            (102400.0, 60000.0),
            (102400.0, 114688.0),
        ],
    },
    ThreatZoneDef {
        name: "Moderate (10-25)",
        color: [200, 200, 0, 7],
        polygon: &[
            (-60000.0, 20000.0),
            (-60000.0, -20000.0),
            (-20000.0, -20000.0),
            (-20000.0, 20000.0),
            (40000.0, 60000.0),
            (-20000.0, 60000.0),
            (-60000.0, 60000.0),
            (-60000.0, 20000.0),
        ],
    },
    ThreatZoneDef {
        name: "Dangerous (20-35)",
        color: [220, 140, 0, 7],
        polygon: &[
            (-20000.0, 20000.0),
            (-20000.0, -20000.0),
            (40000.0, -20000.0),
            (40000.0, 20000.0),
            (102400.0, 20000.0),
            (102400.0, 60000.0),
            (40000.0, 60000.0),
        ],
    },
    ThreatZoneDef {
        name: "High Risk (25-40)",
        color: [220, 60, 0, 9],
        polygon: &[
            (-60000.0, -20000.0),
            (-60000.0, -60000.0),
            (0.0, -60000.0),
            (40000.0, -60000.0),
            (40000.0, -20000.0),
            (-20000.0, -20000.0),
        ],
    },
    ThreatZoneDef {
        name: "Very Dangerous (30-50+)",
        color: [180, 0, 0, 9],
        polygon: &[
            (40000.0, -20000.0),
            (40000.0, -60000.0),
            (102400.0, -60000.0),
            (102400.0, -20000.0),
        ],
    },
    ThreatZoneDef {
        name: "Extreme (35-50+)",
        color: [150, 0, 0, 11],
        polygon: &[
            (-60000.0, -60000.0),
            (-60000.0, -100000.0),
            (102400.0, -100000.0),
            (102400.0, -60000.0),
            (40000.0, -60000.0),
            (0.0, -60000.0),
        ],
    },
    ThreatZoneDef {
        name: "Glowing Sea (40+)",
        color: [140, 0, 40, 14],
        polygon: &[
            (-135168.0, -60000.0),
            (-135168.0, -147456.0),
            (-60000.0, -147456.0),
            (-60000.0, -100000.0),
            (-60000.0, -60000.0),
        ],
    },
];
