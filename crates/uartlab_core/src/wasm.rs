use crate::{ParityMode, SimConfig, SimError, Simulation};
use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;

fn to_js(err: SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Browser handle around [`Simulation`]. The page owns drawing and the
/// auto-run timer; it calls the step functions and polls the accessors.
#[wasm_bindgen]
pub struct UartWasm {
    sim: Simulation,
}

#[wasm_bindgen]
impl UartWasm {
    #[wasm_bindgen(constructor)]
    pub fn new(history_capacity: usize, seed: u64) -> Result<UartWasm, JsValue> {
        let config = SimConfig::builder()
            .history_capacity(history_capacity)
            .seed(seed)
            .build();
        let sim = Simulation::new(config).map_err(to_js)?;
        Ok(UartWasm { sim })
    }

    #[wasm_bindgen]
    pub fn configure_parity(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode: ParityMode = mode.parse().map_err(to_js)?;
        self.sim.configure_parity(mode).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn set_clock_drift(&mut self, percent: f32) -> Result<(), JsValue> {
        self.sim.set_clock_drift(percent).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn set_noise(&mut self, probability: f64) -> Result<(), JsValue> {
        self.sim.set_noise(probability).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn load_byte(&mut self, byte: u8) -> Result<(), JsValue> {
        self.sim.load_byte(byte).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn load_random_byte(&mut self) -> Result<u8, JsValue> {
        self.sim.load_random_byte().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn start_transmit(&mut self) -> Result<(), JsValue> {
        self.sim.start_transmit().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn step_oversample(&mut self) {
        self.sim.step_oversample();
    }

    #[wasm_bindgen]
    pub fn step_baud(&mut self) -> u8 {
        self.sim.step_baud()
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.sim.reset();
    }

    #[wasm_bindgen]
    pub fn tx_state(&self) -> String {
        format!("{:?}", self.sim.tx_state())
    }

    #[wasm_bindgen]
    pub fn rx_state(&self) -> String {
        format!("{:?}", self.sim.rx_state())
    }

    #[wasm_bindgen]
    pub fn tx_shift_register(&self) -> u16 {
        self.sim.tx_shift_register()
    }

    #[wasm_bindgen]
    pub fn rx_shift_register(&self) -> u8 {
        self.sim.rx_shift_register()
    }

    #[wasm_bindgen]
    pub fn rx_bit_count(&self) -> u8 {
        self.sim.rx_bit_count()
    }

    #[wasm_bindgen]
    pub fn rx_oversample_count(&self) -> u8 {
        self.sim.rx_oversample_count()
    }

    #[wasm_bindgen]
    pub fn wire_value(&self) -> bool {
        self.sim.wire_value()
    }

    #[wasm_bindgen]
    pub fn rx_byte(&self) -> Option<u8> {
        self.sim.rx_byte()
    }

    #[wasm_bindgen]
    pub fn frame_error(&self) -> bool {
        self.sim.rx_error_flags().frame_error()
    }

    #[wasm_bindgen]
    pub fn parity_error(&self) -> bool {
        self.sim.rx_error_flags().parity_error()
    }

    /// One byte of `Signals` bits per history entry, oldest first.
    #[wasm_bindgen]
    pub fn waveform_history(&self) -> Uint8Array {
        let bits = self.sim.waveform_history().signal_bits();
        Uint8Array::from(bits.as_slice())
    }
}
