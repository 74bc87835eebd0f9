//! A small heating plant used by `describe` and `dispatch`.
//!
//! ```text
//! Plant
//!   Name, Status, Target            properties (Status is read-only)
//!   Start, Stop, Ramp               methods
//!   StatusChanged                   event
//!   Burner                          node
//!   Zones {1, 2: offline, 3}        node group of Zone (derives Sensor)
//! ```

use graphwire_core::registry::{
    EventDef, EventPayload, Fault, MemberError, MethodDef, NodeDef, NodeGroupDef, PropertyDef,
};
use graphwire_core::{CapabilityRegistry, EventSource, Instance, StaticRegistry, TypeBuilder, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Stopped,
    Running,
    Faulted,
}

const STATUS_NAMES: [&str; 3] = ["Stopped", "Running", "Faulted"];

fn status_type() -> ValueType {
    ValueType::enumeration("Status", STATUS_NAMES)
}

/// Shared reading part of every sensing device.
pub struct Sensor {
    pub reading: Mutex<f64>,
    pub unit: &'static str,
}

pub struct Zone {
    pub sensor: Sensor,
    pub setpoint: Mutex<f64>,
    pub reached: EventSource,
}

impl Zone {
    fn new(reading: f64, setpoint: f64) -> Self {
        Self {
            sensor: Sensor {
                reading: Mutex::new(reading),
                unit: "degC",
            },
            setpoint: Mutex::new(setpoint),
            reached: EventSource::new(),
        }
    }

    fn set_setpoint(&self, setpoint: f64) {
        *lock(&self.setpoint) = setpoint;
        if (*lock(&self.sensor.reading) - setpoint).abs() < 0.5 {
            self.reached.fire(&EventPayload::new("f64", setpoint));
        }
    }
}

#[derive(Default)]
pub struct Burner {
    pub power: Mutex<f64>,
    pub power_changed: EventSource,
}

impl Burner {
    fn set_power(&self, power: f64) -> Result<(), Fault> {
        if !(0.0..=100.0).contains(&power) {
            return Err(Fault::new(
                "ArgumentOutOfRange",
                format!("power {power} is outside 0..=100"),
            ));
        }
        *lock(&self.power) = power;
        self.power_changed.fire(&EventPayload::new("f64", power));
        Ok(())
    }
}

pub struct Plant {
    pub name: Mutex<String>,
    pub status: Mutex<Status>,
    pub target: Mutex<f64>,
    pub status_changed: EventSource,
    pub burner: Arc<Burner>,
    pub zones: BTreeMap<u32, Option<Arc<Zone>>>,
}

impl Plant {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let mut zones = BTreeMap::new();
        zones.insert(1, Some(Arc::new(Zone::new(19.5, 21.0))));
        zones.insert(2, None);
        zones.insert(3, Some(Arc::new(Zone::new(17.0, 18.0))));
        Arc::new(Self {
            name: Mutex::new("Boiler House".to_string()),
            status: Mutex::new(Status::Stopped),
            target: Mutex::new(60.0),
            status_changed: EventSource::new(),
            burner: Arc::new(Burner::default()),
            zones,
        })
    }

    fn set_status(&self, status: Status) {
        *lock(&self.status) = status;
        self.status_changed
            .fire(&EventPayload::new("Status", STATUS_NAMES[status as usize]));
    }

    fn start(&self) -> Result<(), Fault> {
        if *lock(&self.status) == Status::Faulted {
            return Err(Fault::new("InvalidOperation", "plant is faulted"));
        }
        self.burner.set_power(40.0)?;
        self.set_status(Status::Running);
        Ok(())
    }

    fn stop(&self) -> Result<(), Fault> {
        self.burner.set_power(0.0)?;
        self.set_status(Status::Stopped);
        Ok(())
    }
}

fn sensor_type() -> TypeBuilder<Sensor> {
    TypeBuilder::<Sensor>::new("Sensor")
        .help("anything that reports a reading")
        .property(
            PropertyDef::new("Reading", ValueType::Float)
                .help("last measured value")
                .get(|s: &Sensor| *lock(&s.reading)),
        )
        .property(PropertyDef::new("Unit", ValueType::String).get(|s: &Sensor| s.unit))
}

fn zone_type() -> TypeBuilder<Zone> {
    TypeBuilder::<Zone>::new("Zone")
        .help("one heated zone")
        .include(sensor_type(), |z: &Zone| &z.sensor)
        .property(
            PropertyDef::new("Setpoint", ValueType::Float)
                .get(|z: &Zone| *lock(&z.setpoint))
                .set(|z: &Zone, setpoint: f64| {
                    z.set_setpoint(setpoint);
                    Ok(())
                }),
        )
        .event(
            EventDef::new("Reached", ValueType::Float, |z: &Zone| z.reached.clone())
                .help("raised when a new setpoint matches the reading"),
        )
}

fn burner_type() -> TypeBuilder<Burner> {
    TypeBuilder::<Burner>::new("Burner")
        .property(
            PropertyDef::new("Power", ValueType::Float)
                .help("firing rate in percent")
                .get(|b: &Burner| *lock(&b.power))
                .set(|b: &Burner, power: f64| b.set_power(power)),
        )
        .event(EventDef::new("PowerChanged", ValueType::Float, |b: &Burner| {
            b.power_changed.clone()
        }))
}

fn plant_type() -> TypeBuilder<Plant> {
    TypeBuilder::<Plant>::new("Plant")
        .help("demo heating plant")
        .property(
            PropertyDef::new("Name", ValueType::String)
                .get(|p: &Plant| lock(&p.name).clone())
                .set(|p: &Plant, name: String| {
                    *lock(&p.name) = name;
                    Ok(())
                }),
        )
        .property(PropertyDef::new("Status", status_type()).get(|p: &Plant| *lock(&p.status)))
        .property(
            PropertyDef::new("Target", ValueType::Float)
                .help("flow temperature target")
                .get(|p: &Plant| *lock(&p.target))
                .set(|p: &Plant, target: f64| {
                    *lock(&p.target) = target;
                    Ok(())
                }),
        )
        .method(
            MethodDef::new("Start")
                .help("light the burner")
                .invoke(|p: &Plant, _| p.start().map_err(MemberError::from)),
        )
        .method(
            MethodDef::new("Stop").invoke(|p: &Plant, _| p.stop().map_err(MemberError::from)),
        )
        .method(
            MethodDef::new("Ramp")
                .help("move the target and burner power together")
                .param("Target", ValueType::Float)
                .param("Power", ValueType::Float)
                .invoke(|p: &Plant, args| {
                    let target: f64 = args.get(0)?;
                    let power: f64 = args.get(1)?;
                    p.burner.set_power(power)?;
                    *lock(&p.target) = target;
                    Ok(())
                }),
        )
        .event(
            EventDef::new("StatusChanged", status_type(), |p: &Plant| {
                p.status_changed.clone()
            })
            .help("raised after start and stop"),
        )
        .node(NodeDef::new("Burner", |p: &Plant| Some(Arc::clone(&p.burner))))
        .node_group(NodeGroupDef::new("Zones", |p: &Plant| {
            p.zones
                .iter()
                .map(|(key, zone)| (*key, zone.clone()))
                .collect()
        }))
}

/// The registry describing every demo type.
pub fn registry() -> graphwire_core::Result<Arc<dyn CapabilityRegistry>> {
    let registry = StaticRegistry::builder()
        .register(sensor_type())?
        .register(zone_type())?
        .register(burner_type())?
        .register(plant_type())?
        .build();
    Ok(Arc::new(registry))
}

/// A fresh plant as a graph root.
#[must_use]
pub fn root() -> Instance {
    Plant::new()
}
