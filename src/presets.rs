use crate::cli::Preset;
use crate::model::{PriceTable, WorkItem};

struct PresetItem {
    code: &'static str,
    description: &'static str,
    unit: &'static str,
    labor: &'static [(&'static str, f64)],
    material: &'static [(&'static str, f64)],
    equipment: &'static [(&'static str, f64)],
}

const SDA_ITEMS: &[PresetItem] = &[
    PresetItem {
        code: "T.01",
        description: "Galian Tanah Biasa (Manual)",
        unit: "m3",
        labor: &[("Pekerja", 0.750), ("Mandor", 0.025)],
        material: &[],
        equipment: &[],
    },
    PresetItem {
        code: "P.01",
        description: "Pasangan Batu Kali 1:4",
        unit: "m3",
        labor: &[("Pekerja", 1.500), ("Tukang Batu", 0.750), ("Mandor", 0.075)],
        material: &[("Batu Kali", 1.200), ("Semen", 163.0), ("Pasir", 0.520)],
        equipment: &[],
    },
    PresetItem {
        code: "B.05",
        description: "Beton K-175 (Manual)",
        unit: "m3",
        labor: &[("Pekerja", 1.650), ("Tukang Batu", 0.275), ("Mandor", 0.083)],
        material: &[("Semen", 326.0), ("Pasir", 0.760), ("Kerikil", 1.029)],
        equipment: &[],
    },
];

const SDA_PRICES: &[(&str, f64)] = &[
    ("Pekerja", 100_000.0),
    ("Mandor", 150_000.0),
    ("Tukang Batu", 120_000.0),
    ("Semen", 1_300.0),
    ("Pasir", 250_000.0),
    ("Batu Kali", 300_000.0),
    ("Kerikil", 280_000.0),
];

const CIPTA_KARYA_ITEMS: &[PresetItem] = &[
    PresetItem {
        code: "A.4.4.1",
        description: "Pasangan Dinding Bata Merah 1:4",
        unit: "m2",
        labor: &[("Pekerja", 0.300), ("Tukang Batu", 0.100), ("Mandor", 0.015)],
        material: &[("Bata Merah", 70.0), ("Semen PC", 11.50), ("Pasir Pasang", 0.043)],
        equipment: &[],
    },
    PresetItem {
        code: "A.4.1.1",
        description: "Beton Mutu fc = 19.3 MPa (K-225)",
        unit: "m3",
        labor: &[("Pekerja", 1.650), ("Tukang Batu", 0.275), ("Mandor", 0.083)],
        material: &[("Semen PC", 371.0), ("Pasir Beton", 0.698), ("Kerikil", 1.047)],
        equipment: &[("Concrete Mixer", 0.250)],
    },
    PresetItem {
        code: "P.01",
        description: "Pemasangan Lantai Keramik 40x40",
        unit: "m2",
        labor: &[("Pekerja", 0.700), ("Tukang Keramik", 0.350), ("Mandor", 0.035)],
        material: &[
            ("Keramik 40x40", 1.05),
            ("Semen PC", 10.0),
            ("Pasir", 0.045),
            ("Semen Warna", 1.50),
        ],
        equipment: &[],
    },
];

const CIPTA_KARYA_PRICES: &[(&str, f64)] = &[
    ("Pekerja", 120_000.0),
    ("Tukang Batu", 140_000.0),
    ("Mandor", 170_000.0),
    ("Semen PC", 1_450.0),
    ("Pasir Pasang", 280_000.0),
    ("Bata Merah", 900.0),
    ("Kerikil", 300_000.0),
    ("Keramik 40x40", 65_000.0),
    ("Concrete Mixer", 150_000.0),
];

const BINA_MARGA_ITEMS: &[PresetItem] = &[
    PresetItem {
        code: "Div.3.2",
        description: "Galian Biasa untuk Drainase & Saluran Air",
        unit: "m3",
        labor: &[("Pekerja", 0.10), ("Mandor", 0.01)],
        material: &[],
        equipment: &[("Excavator", 0.035), ("Dump Truck", 0.050)],
    },
    PresetItem {
        code: "Div.5.1",
        description: "Lapis Pondasi Agregat Kelas A (LPA)",
        unit: "m3",
        labor: &[("Pekerja", 0.20), ("Mandor", 0.02)],
        material: &[("Agregat Kelas A", 1.20)],
        equipment: &[
            ("Wheel Loader", 0.015),
            ("Motor Grader", 0.010),
            ("Vibratory Roller", 0.012),
            ("Water Tanker", 0.010),
        ],
    },
    PresetItem {
        code: "Div.6.3",
        description: "Laston Lapis Aus (AC-WC)",
        unit: "Ton",
        labor: &[("Pekerja", 0.30), ("Mandor", 0.03)],
        material: &[
            ("Aspal Cair", 0.06),
            ("Agregat Kasar", 0.45),
            ("Agregat Halus", 0.45),
            ("Filler", 0.04),
        ],
        equipment: &[
            ("Asphalt Mixing Plant", 0.010),
            ("Asphalt Finisher", 0.015),
            ("Tandem Roller", 0.020),
            ("Pneumatic Tire Roller", 0.020),
        ],
    },
];

const BINA_MARGA_PRICES: &[(&str, f64)] = &[
    ("Pekerja", 110_000.0),
    ("Mandor", 160_000.0),
    ("Agregat Kelas A", 250_000.0),
    ("Aspal Cair", 12_000.0),
    ("Excavator", 450_000.0),
    ("Dump Truck", 300_000.0),
    ("Motor Grader", 600_000.0),
    ("Vibratory Roller", 500_000.0),
    ("Asphalt Finisher", 800_000.0),
];

fn preset_items(preset: Preset) -> &'static [PresetItem] {
    match preset {
        Preset::Sda => SDA_ITEMS,
        Preset::CiptaKarya => CIPTA_KARYA_ITEMS,
        Preset::BinaMarga => BINA_MARGA_ITEMS,
    }
}

/// Sample work items bundled for one public-works domain.
pub fn preset_catalog(preset: Preset) -> Vec<WorkItem> {
    preset_items(preset)
        .iter()
        .map(|entry| {
            let mut item = WorkItem::new(entry.code, entry.description, Some(entry.unit));
            item.resources.labor = entry.labor.iter().copied().collect();
            item.resources.material = entry.material.iter().copied().collect();
            item.resources.equipment = entry.equipment.iter().copied().collect();
            item
        })
        .collect()
}

/// Default basic prices that seed the price table for a preset.
pub fn preset_prices(preset: Preset) -> PriceTable {
    let prices = match preset {
        Preset::Sda => SDA_PRICES,
        Preset::CiptaKarya => CIPTA_KARYA_PRICES,
        Preset::BinaMarga => BINA_MARGA_PRICES,
    };
    prices.iter().copied().collect()
}
