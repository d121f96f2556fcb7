//! Built-in car table used when no catalog file can be read.
//!
//! Model and shadow paths follow the `<stem>.i3d` / `<stem>_shadow.i3d`
//! naming of the shipped data; masks are the values the garage screen
//! expects for each car.

use super::GarageCarCatalogEntry;

/// No championship class.
const R0: u32 = 0;
const R_CLASS_B: u32 = 0x0000_0001;
const R_CLASS_A: u32 = 0x0000_0003;
const R_RACER: u32 = 0x0000_0007;

const FR_CITY: u32 = 0x0000_0001;
const FR_COUNTRY: u32 = 0x0000_0003;
const FR_SPECIAL: u32 = 0x0000_0004;
const FR_RACE: u32 = 0x0000_0010;
const FR_EXTREME: u32 = 0x0000_0020;

struct EmbeddedCar {
    code: &'static str,
    model_stem: &'static str,
    name: &'static str,
    race_mask: u32,
    freeride_mask: u32,
}

const fn car(
    code: &'static str,
    model_stem: &'static str,
    name: &'static str,
    race_mask: u32,
    freeride_mask: u32,
) -> EmbeddedCar {
    EmbeddedCar {
        code,
        model_stem,
        name,
        race_mask,
        freeride_mask,
    }
}

#[rustfmt::skip]
const EMBEDDED_CARS: &[EmbeddedCar] = &[
    car("bolt_ace_tudor", "bolt_ace_tudor", "Bolt Ace Tudor", R0, FR_CITY),
    car("bolt_ace_coupe", "bolt_ace_coupe", "Bolt Ace Coupe", R0, FR_CITY),
    car("bolt_ace_fordor", "bolt_ace_fordor", "Bolt Ace Fordor", R0, FR_CITY),
    car("bolt_ace_pickup", "bolt_ace_pickup", "Bolt Ace Pickup", R0, FR_CITY),
    car("bolt_ace_runabout", "bolt_ace_runabout", "Bolt Ace Runabout", R0, FR_CITY),
    car("bolt_ace_touring", "bolt_ace_touring", "Bolt Ace Touring", R0, FR_CITY),
    car("bolt_b_cabrio", "bolt_b_cabrio", "Bolt Model B Cabriolet", R0, FR_CITY),
    car("bolt_b_coupe", "bolt_b_coupe", "Bolt Model B Coupe", R0, FR_CITY),
    car("bolt_b_delivery", "bolt_b_delivery", "Bolt Model B Delivery", R0, FR_CITY),
    car("bolt_b_fordor", "bolt_b_fordor", "Bolt Model B Fordor", R0, FR_CITY),
    car("bolt_b_roadster", "bolt_b_roadster", "Bolt Model B Roadster", R0, FR_CITY),
    car("bolt_b_tudor", "bolt_b_tudor", "Bolt Model B Tudor", R0, FR_CITY),
    car("bolt_pickup", "bolt_pickup", "Bolt Pickup", R0, FR_CITY),
    car("bolt_v8_coupe", "bolt_v8_coupe", "Bolt V8 Coupe", R0, FR_CITY),
    car("bolt_v8_fordor", "bolt_v8_fordor", "Bolt V8 Fordor", R0, FR_CITY),
    car("bolt_v8_roadster", "bolt_v8_roadster", "Bolt V8 Roadster", R0, FR_CITY),
    car("bolt_v8_touring", "bolt_v8_touring", "Bolt V8 Touring", R0, FR_CITY),
    car("bolt_v8_tudor", "bolt_v8_tudor", "Bolt V8 Tudor", R0, FR_CITY),
    car("bolt_truck", "bolt_truck", "Bolt Truck", R0, FR_CITY),
    car("bolt_truck_flatbed", "bolt_truck_flat", "Bolt Truck Flatbed", R0, FR_CITY),
    car("bolt_ambulance", "bolt_ambulance", "Bolt Ambulance", R0, FR_SPECIAL),
    car("bolt_hearse", "bolt_hearse", "Bolt Hearse", R0, FR_SPECIAL),
    car("brubaker_4wd", "brubaker_4wd", "Brubaker 4WD", R0, FR_COUNTRY),
    car("celeste_marque", "celeste_marque", "Celeste Marque 500", R_CLASS_B, FR_CITY),
    car("crusader_fordor", "crusader_fordor", "Crusader Chromium Fordor", R0, FR_CITY),
    car("crusader_forte", "crusader_forte", "Crusader Chromium Forte", R0, FR_CITY),
    car("falconer", "falconer", "Falconer", R0, FR_CITY),
    car("falconer_classic", "falconer_classic", "Falconer Classic", R0, FR_CITY),
    car("falconer_gangster", "falconer_gangster", "Falconer Gangster", R0, FR_SPECIAL),
    car("falconer_yellowcar", "falconer_yellow", "Falconer Yellowcar", R0, FR_CITY),
    car("guardian_tp_coupe", "guardian_coupe", "Guardian Terraplane Coupe", R0, FR_CITY),
    car("guardian_tp_fordor", "guardian_fordor", "Guardian Terraplane Fordor", R0, FR_CITY),
    car("guardian_tp_tudor", "guardian_tudor", "Guardian Terraplane Tudor", R0, FR_CITY),
    car("lassiter_v16_appolyon", "lassiter_appolyon", "Lassiter V16 Appolyon", R_CLASS_A, FR_CITY),
    car("lassiter_v16_fordor", "lassiter_fordor", "Lassiter V16 Fordor", R_CLASS_A, FR_CITY),
    car("lassiter_v16_phaeton", "lassiter_phaeton", "Lassiter V16 Phaeton", R_CLASS_A, FR_CITY),
    car("lassiter_v16_roadster", "lassiter_roadster", "Lassiter V16 Roadster", R_CLASS_A, FR_CITY),
    car("schubert_e6_fordor", "schubert_e6_fordor", "Schubert Extra Six Fordor", R0, FR_CITY),
    car("schubert_e6_tudor", "schubert_e6_tudor", "Schubert Extra Six Tudor", R0, FR_CITY),
    car("schubert_six", "schubert_six", "Schubert Six", R0, FR_CITY),
    car("schubert_six_police", "schubert_police", "Schubert Six Police", R0, FR_SPECIAL),
    car("schubert_six_taxi", "schubert_taxi", "Schubert Six Taxi", R0, FR_CITY),
    car("schubert_truck", "schubert_truck", "Schubert Truck", R0, FR_CITY),
    car("silver_fletcher", "silver_fletcher", "Silver Fletcher", R_CLASS_A, FR_CITY),
    car("smith_coupe", "smith_coupe", "Smith Coupe", R0, FR_CITY),
    car("smith_deluxe_wagon", "smith_wagon", "Smith Deluxe Station Wagon", R0, FR_CITY),
    car("smith_thunderbolt", "smith_thunderbolt", "Smith Thunderbolt", R_CLASS_B, FR_CITY),
    car("smith_truck", "smith_truck", "Smith Truck", R0, FR_CITY),
    car("smith_v8", "smith_v8", "Smith V8", R_CLASS_B, FR_CITY),
    car("smith_v12", "smith_v12", "Smith V12", R_CLASS_A, FR_CITY),
    car("thor_810_cabrio", "thor_810_cabrio", "Thor 810 Cabriolet", R_CLASS_B, FR_CITY),
    car("thor_810_phaeton", "thor_810_phaeton", "Thor 810 Phaeton", R_CLASS_B, FR_CITY),
    car("thor_810_sedan", "thor_810_sedan", "Thor 810 Sedan", R_CLASS_B, FR_CITY),
    car("thor_812_cabrio", "thor_812_cabrio", "Thor 812 Cabriolet", R_CLASS_B, FR_CITY),
    car("thor_812_phaeton", "thor_812_phaeton", "Thor 812 Phaeton", R_CLASS_B, FR_CITY),
    car("trautenberg_model_j", "trautenberg_j", "Trautenberg Model J", R_CLASS_A, FR_CITY),
    car("trautenberg_sport", "trautenberg_sport", "Trautenberg Sport", R_CLASS_A, FR_CITY),
    car("ulver_airstream_fordor", "ulver_fordor", "Ulver Airstream Fordor", R0, FR_CITY),
    car("ulver_airstream_tudor", "ulver_tudor", "Ulver Airstream Tudor", R0, FR_CITY),
    car("wright_coupe", "wright_coupe", "Wright Coupe", R0, FR_CITY),
    car("wright_fordor", "wright_fordor", "Wright Fordor", R0, FR_CITY),
    car("bolt_racer", "bolt_racer", "Bolt Racer", R_RACER, FR_RACE),
    car("celeste_racer", "celeste_racer", "Celeste Racer", R_RACER, FR_RACE),
    car("crusader_racer", "crusader_racer", "Crusader Racer", R_RACER, FR_RACE),
    car("falconer_racer", "falconer_racer", "Falconer Racer", R_RACER, FR_RACE),
    car("lassiter_racer", "lassiter_racer", "Lassiter Racer", R_RACER, FR_RACE),
    car("schubert_racer", "schubert_racer", "Schubert Racer", R_RACER, FR_RACE),
    car("thor_racer", "thor_racer", "Thor Racer", R_RACER, FR_RACE),
    car("trautenberg_racer", "trautenberg_racer", "Trautenberg Racer", R_RACER, FR_RACE),
    car("wright_racer", "wright_racer", "Wright Racer", R_RACER, FR_RACE),
    car("flamer", "flamer", "Flamer", R0, FR_EXTREME),
    car("hotrod", "hotrod", "Hot Rod", R0, FR_EXTREME),
    car("black_dragon", "black_dragon", "Black Dragon", R0, FR_EXTREME),
    car("black_metal", "black_metal", "Black Metal", R0, FR_EXTREME),
    car("bob_mylan", "bob_mylan", "Bob Mylan", R0, FR_EXTREME),
    car("manta_prototype", "manta_prototype", "Manta Prototype", R0, FR_EXTREME),
    car("manta_taxi", "manta_taxi", "Manta Taxi", R0, FR_EXTREME),
    car("ufo", "ufo", "Flying Saucer", R0, FR_EXTREME),
    car("bulldozer", "bulldozer", "Bulldozer", R0, FR_EXTREME),
    car("tank", "tank", "Tank", R0, FR_EXTREME),
];

pub fn embedded_catalog() -> Vec<GarageCarCatalogEntry> {
    EMBEDDED_CARS
        .iter()
        .enumerate()
        .map(|(index, car)| GarageCarCatalogEntry {
            index: index as u32,
            code: car.code.to_string(),
            model: format!("{}.i3d", car.model_stem),
            shadow: format!("{}_shadow.i3d", car.model_stem),
            display_name: car.name.to_string(),
            race_mask: car.race_mask,
            champ_mask: 0,
            freeride_mask: car.freeride_mask,
            masks_known: true,
        })
        .collect()
}
