// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Registry of the drivers created for one data server connection.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use zhinst_log::info;

use crate::backing::{ImpedanceModuleBacking, PqscBacking, ShfqaBacking, ShfqaSweeperBacking};
use crate::devices::{Pqsc, Shfqa};
use crate::modules::{ImpedanceModule, ShfqaSweeper};
use crate::{DriverSettings, Error, Instrument, Result};

pub struct Session {
    settings: DriverSettings,
    devices: RefCell<IndexMap<String, Rc<dyn Instrument>>>,
    sweeper_count: Cell<usize>,
}

impl Session {
    pub fn new(settings: DriverSettings) -> Rc<Self> {
        zhinst_log::init_logging(settings.diagnostics);
        Rc::new(Session {
            settings,
            devices: RefCell::new(IndexMap::new()),
            sweeper_count: Cell::new(0),
        })
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    pub fn connect_shfqa(&self, backing: Rc<dyn ShfqaBacking>) -> Result<Rc<Shfqa>> {
        let shfqa = Rc::new(Shfqa::new(backing, &self.settings)?);
        self.add_device(shfqa.clone())?;
        Ok(shfqa)
    }

    pub fn connect_pqsc(&self, backing: Rc<dyn PqscBacking>) -> Result<Rc<Pqsc>> {
        let pqsc = Rc::new(Pqsc::new(backing, &self.settings)?);
        self.add_device(pqsc.clone())?;
        Ok(pqsc)
    }

    /// Register a device driver under its serial.
    pub fn add_device(&self, device: Rc<dyn Instrument>) -> Result<()> {
        let serial = device.serial().to_lowercase();
        let mut devices = self.devices.borrow_mut();
        if devices.contains_key(&serial) {
            return Err(Error::DuplicateName {
                parent: "session".to_string(),
                name: serial,
            });
        }
        info!("Connected {} as {}", serial, device.node().full_name());
        devices.insert(serial, device);
        Ok(())
    }

    /// Driver of the device with `serial`, case insensitive.
    pub fn device(&self, serial: &str) -> Result<Rc<dyn Instrument>> {
        self.devices
            .borrow()
            .get(&serial.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::NotFound {
                parent: "session".to_string(),
                name: serial.to_string(),
            })
    }

    /// All registered devices in connection order.
    pub fn devices(&self) -> Vec<Rc<dyn Instrument>> {
        self.devices.borrow().values().cloned().collect()
    }

    pub fn create_impedance_module(
        &self,
        backing: Rc<dyn ImpedanceModuleBacking>,
    ) -> Result<ImpedanceModule> {
        ImpedanceModule::new(backing, &self.settings, None)
    }

    /// Create a sweeper named `zi_shfqasweeper_{n}`, with `n` counting the
    /// sweepers of this session.
    pub fn create_shfqa_sweeper(
        self: &Rc<Self>,
        backing: Rc<dyn ShfqaSweeperBacking>,
    ) -> Result<ShfqaSweeper> {
        let index = self.sweeper_count.get();
        let name = format!("{}_shfqasweeper_{}", self.settings.name_prefix, index);
        let sweeper = ShfqaSweeper::new(backing, Rc::downgrade(self), &self.settings, name)?;
        self.sweeper_count.set(index + 1);
        Ok(sweeper)
    }
}

#[cfg(test)]
mod tests {
    use zhinst_nodetree::InstrumentModule;

    use super::*;
    use crate::testing::{FakeImpedanceModule, FakePqsc, FakeShfqa, FakeShfqaSweeper, Recorder};

    #[test]
    fn test_device_registry() {
        let recorder = Recorder::new();
        let session = Session::new(DriverSettings::default());
        session.connect_shfqa(Rc::new(FakeShfqa::new("dev12000", &recorder))).unwrap();
        session.connect_pqsc(Rc::new(FakePqsc::new("DEV10000", &recorder))).unwrap();

        assert_eq!(session.device("DEV12000").unwrap().device_type(), "SHFQA");
        assert_eq!(session.device("dev10000").unwrap().node().name(), "zi_pqsc_dev10000");
        let serials = session.devices().iter().map(|d| d.serial().to_string()).collect::<Vec<_>>();
        assert_eq!(serials, vec!["dev12000", "dev10000"]);
        assert!(matches!(session.device("dev1"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_duplicate_device() {
        let recorder = Recorder::new();
        let session = Session::new(DriverSettings::default());
        session.connect_shfqa(Rc::new(FakeShfqa::new("dev12000", &recorder))).unwrap();
        let Err(err) = session.connect_shfqa(Rc::new(FakeShfqa::new("dev12000", &recorder))) else {
            panic!("dev12000 registered twice");
        };
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert_eq!(session.devices().len(), 1);
    }

    #[test]
    fn test_module_names() {
        let recorder = Recorder::new();
        let session = Session::new(DriverSettings::default());
        let first = session
            .create_shfqa_sweeper(Rc::new(FakeShfqaSweeper::new(&recorder)))
            .unwrap();
        let second = session
            .create_shfqa_sweeper(Rc::new(FakeShfqaSweeper::new(&recorder)))
            .unwrap();
        assert_eq!(first.node().name(), "zi_shfqasweeper_0");
        assert_eq!(second.node().name(), "zi_shfqasweeper_1");

        let other = Session::new(DriverSettings::default());
        let third = other.create_shfqa_sweeper(Rc::new(FakeShfqaSweeper::new(&recorder))).unwrap();
        assert_eq!(third.node().name(), "zi_shfqasweeper_0");

        let impedance = session
            .create_impedance_module(Rc::new(FakeImpedanceModule::new(&recorder)))
            .unwrap();
        assert_eq!(impedance.node().name(), "impedance_module");
    }
}
