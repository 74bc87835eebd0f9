//! Sample device graph shared by the integration tests.
//!
//! ```text
//! Station
//!   Name, Mode, Setpoint, Uptime    properties
//!   Reset, Calibrate, Explode       methods
//!   ModeChanged                     event
//!   Pump                            node
//!   Spare                           node, never present
//!   Valves {1, 2: absent, 3}        node group of Valve (derives Device)
//! ```

#![allow(dead_code)]

use graphwire_core::registry::{
    EventDef, EventPayload, Fault, MemberError, MethodDef, NodeDef, NodeGroupDef, PropertyDef,
};
use graphwire_core::{
    CapabilityRegistry, ChannelRequestor, Dispatcher, EventSource, FeedbackCache, Instance,
    Requestor, Session, StaticRegistry, TypeBuilder, ValueType,
};
use graphwire_proto::ClassInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Idle,
    Running,
    Fault,
}

impl Mode {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Fault => "Fault",
        }
    }
}

fn mode_type() -> ValueType {
    ValueType::enumeration("Mode", ["Idle", "Running", "Fault"])
}

#[derive(Default)]
pub struct Device {
    pub serial: String,
}

pub struct Valve {
    pub device: Device,
    pub open: Mutex<bool>,
    pub toggled: EventSource,
}

impl Valve {
    pub fn new(serial: &str) -> Self {
        Self {
            device: Device {
                serial: serial.to_string(),
            },
            open: Mutex::new(false),
            toggled: EventSource::new(),
        }
    }

    pub fn set_open(&self, open: bool) {
        *self.open.lock().unwrap() = open;
        self.toggled.fire(&EventPayload::new("bool", open));
    }
}

#[derive(Default)]
pub struct Pump {
    pub rpm: Mutex<f64>,
    pub rpm_changed: EventSource,
}

impl Pump {
    pub fn set_rpm(&self, rpm: f64) {
        *self.rpm.lock().unwrap() = rpm;
        self.rpm_changed.fire(&EventPayload::new("f64", rpm));
    }
}

pub struct Station {
    pub name: Mutex<String>,
    pub mode: Mutex<Mode>,
    pub setpoint: Mutex<f64>,
    pub resets: AtomicUsize,
    pub calibration: Mutex<Option<(f64, Mode)>>,
    pub mode_changed: EventSource,
    pub pump: Arc<Pump>,
    pub valves: Mutex<BTreeMap<u32, Option<Arc<Valve>>>>,
}

impl Station {
    pub fn new() -> Self {
        let mut valves = BTreeMap::new();
        valves.insert(1, Some(Arc::new(Valve::new("V-001"))));
        valves.insert(2, None);
        valves.insert(3, Some(Arc::new(Valve::new("V-003"))));
        Self {
            name: Mutex::new("North".to_string()),
            mode: Mutex::new(Mode::Idle),
            setpoint: Mutex::new(1.0),
            resets: AtomicUsize::new(0),
            calibration: Mutex::new(None),
            mode_changed: EventSource::new(),
            pump: Arc::new(Pump::default()),
            valves: Mutex::new(valves),
        }
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
        self.mode_changed
            .fire(&EventPayload::new("Mode", mode.name()));
    }

    pub fn valve(&self, key: u32) -> Option<Arc<Valve>> {
        self.valves.lock().unwrap().get(&key).cloned().flatten()
    }
}

fn device_type() -> TypeBuilder<Device> {
    TypeBuilder::<Device>::new("Device")
        .help("any field device")
        .property(
            PropertyDef::new("Serial", ValueType::String).get(|d: &Device| d.serial.clone()),
        )
}

fn valve_type() -> TypeBuilder<Valve> {
    TypeBuilder::<Valve>::new("Valve")
        .include(device_type(), |v: &Valve| &v.device)
        .property(
            PropertyDef::new("Open", ValueType::Bool)
                .get(|v: &Valve| *v.open.lock().unwrap())
                .set(|v: &Valve, open: bool| {
                    v.set_open(open);
                    Ok(())
                }),
        )
        .event(EventDef::new("Toggled", ValueType::Bool, |v: &Valve| {
            v.toggled.clone()
        }))
}

fn pump_type() -> TypeBuilder<Pump> {
    TypeBuilder::<Pump>::new("Pump").property(
        PropertyDef::new("Rpm", ValueType::Float)
            .get(|p: &Pump| *p.rpm.lock().unwrap())
            .set(|p: &Pump, rpm: f64| {
                p.set_rpm(rpm);
                Ok(())
            }),
    )
    .event(EventDef::new("RpmChanged", ValueType::Float, |p: &Pump| {
        p.rpm_changed.clone()
    }))
}

fn station_type() -> TypeBuilder<Station> {
    TypeBuilder::<Station>::new("Station")
        .help("pumping station")
        .property(
            PropertyDef::new("Name", ValueType::String)
                .get(|s: &Station| s.name.lock().unwrap().clone())
                .set(|s: &Station, name: String| {
                    *s.name.lock().unwrap() = name;
                    Ok(())
                }),
        )
        .property(
            PropertyDef::new("Mode", mode_type())
                .get(|s: &Station| *s.mode.lock().unwrap())
                .set(|s: &Station, mode: Mode| {
                    s.set_mode(mode);
                    Ok(())
                }),
        )
        .property(
            PropertyDef::new("Setpoint", ValueType::Float)
                .get(|s: &Station| *s.setpoint.lock().unwrap())
                .set(|s: &Station, value: f64| {
                    if value < 0.0 {
                        return Err(Fault::new("RangeError", "setpoint must not be negative"));
                    }
                    *s.setpoint.lock().unwrap() = value;
                    Ok(())
                }),
        )
        .property(
            PropertyDef::new("Uptime", ValueType::UInt).get(|_: &Station| 3600_u64),
        )
        .method(MethodDef::new("Reset").help("reset counters").invoke(
            |s: &Station, _| {
                s.resets.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        ))
        .method(
            MethodDef::new("Calibrate")
                .param("Offset", ValueType::Float)
                .param("Mode", mode_type())
                .invoke(|s: &Station, args| {
                    let offset: f64 = args.get(0)?;
                    let mode: Mode = args.get(1)?;
                    *s.calibration.lock().unwrap() = Some((offset, mode));
                    Ok(())
                }),
        )
        .method(MethodDef::new("Explode").invoke(|_: &Station, _| {
            Err(MemberError::Fault(Fault::new(
                "InvalidOperation",
                "station refuses",
            )))
        }))
        .event(
            EventDef::new("ModeChanged", mode_type(), |s: &Station| {
                s.mode_changed.clone()
            })
            .help("raised after every mode change"),
        )
        .node(NodeDef::new("Pump", |s: &Station| Some(Arc::clone(&s.pump))))
        .node(NodeDef::new("Spare", |_: &Station| None::<Arc<Pump>>))
        .node_group(NodeGroupDef::new("Valves", |s: &Station| {
            s.valves
                .lock()
                .unwrap()
                .iter()
                .map(|(key, valve)| (*key, valve.clone()))
                .collect()
        }))
}

pub fn registry() -> Arc<dyn CapabilityRegistry> {
    Arc::new(
        StaticRegistry::builder()
            .register(device_type())
            .unwrap()
            .register(valve_type())
            .unwrap()
            .register(pump_type())
            .unwrap()
            .register(station_type())
            .unwrap()
            .build(),
    )
}

/// A dispatcher over the sample graph plus the graph root.
pub fn fixture() -> (Dispatcher, Arc<Station>) {
    let registry = registry();
    let feedback = FeedbackCache::new(Arc::clone(&registry));
    (Dispatcher::new(registry, feedback), Arc::new(Station::new()))
}

/// A session on `station` for a fresh channel requestor.
pub fn session(station: &Arc<Station>, label: &str) -> (Session, Receiver<ClassInfo>) {
    let (requestor, feedback) = ChannelRequestor::new(label);
    let root: Instance = Arc::clone(station) as Instance;
    let requestor: Arc<dyn Requestor> = requestor;
    (Session::new(root, requestor), feedback)
}
