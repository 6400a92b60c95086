//! Scripted fake brick answering LCP frames over a duplex pipe.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

pub const SET_OUTPUT_STATE: u8 = 0x04;
pub const SET_INPUT_MODE: u8 = 0x05;

#[derive(Default)]
pub struct State {
    pub inputs: [(u8, u8); 4],
    /// Raw `SetOutputState` arguments per port.
    pub outputs: [[u8; 10]; 3],
    pub name: Vec<u8>,
    pub messages: Vec<(u8, Vec<u8>)>,
}

pub struct FakeBrick {
    log: Arc<Mutex<Vec<Vec<u8>>>>,
    state: Arc<Mutex<State>>,
    statuses: Arc<Mutex<HashMap<u8, u8>>>,
    task: JoinHandle<()>,
}

impl FakeBrick {
    /// Answer every request that asks for a reply.
    pub fn spawn(stream: DuplexStream) -> Self {
        Self::start(stream, true)
    }

    /// Record requests but never reply.
    pub fn silent(stream: DuplexStream) -> Self {
        Self::start(stream, false)
    }

    fn start(stream: DuplexStream, replies: bool) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(Mutex::new(State::default()));
        let statuses = Arc::new(Mutex::new(HashMap::new()));

        let task = tokio::spawn(serve(
            stream,
            log.clone(),
            state.clone(),
            statuses.clone(),
            replies,
        ));

        Self {
            log,
            state,
            statuses,
            task,
        }
    }

    /// Answer the next request with `opcode` using `status`.
    pub fn fail_next(&self, opcode: u8, status: u8) {
        self.statuses.lock().unwrap().insert(opcode, status);
    }

    /// Payloads received so far.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.log.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<(u8, Vec<u8>)> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn name(&self) -> Vec<u8> {
        self.state.lock().unwrap().name.clone()
    }

    /// Wait for the client to close the channel and return every payload.
    pub async fn finish(self) -> Vec<Vec<u8>> {
        let FakeBrick { log, task, .. } = self;
        task.await.unwrap();
        let received = log.lock().unwrap().clone();
        received
    }
}

async fn serve(
    mut stream: DuplexStream,
    log: Arc<Mutex<Vec<Vec<u8>>>>,
    state: Arc<Mutex<State>>,
    statuses: Arc<Mutex<HashMap<u8, u8>>>,
    replies: bool,
) {
    loop {
        let mut prefix = [0u8; 2];
        if stream.read_exact(&mut prefix).await.is_err() {
            return;
        }
        let mut payload = vec![0u8; u16::from_le_bytes(prefix) as usize];
        if stream.read_exact(&mut payload).await.is_err() {
            return;
        }
        log.lock().unwrap().push(payload.clone());

        let data = handle(&payload, &mut state.lock().unwrap());
        if !replies || payload[0] & 0x80 != 0 {
            continue;
        }

        let status = statuses.lock().unwrap().remove(&payload[1]).unwrap_or(0);
        let mut reply = vec![0x02, payload[1], status];
        reply.extend(data);

        let mut frame = (reply.len() as u16).to_le_bytes().to_vec();
        frame.extend(reply);
        if stream.write_all(&frame).await.is_err() {
            return;
        }
    }
}

fn handle(payload: &[u8], state: &mut State) -> Vec<u8> {
    let args = &payload[2..];
    match payload[1] {
        0x05 => {
            state.inputs[args[0] as usize] = (args[1], args[2]);
            vec![]
        }
        0x07 => {
            let (kind, mode) = state.inputs[args[0] as usize];
            let mut data = vec![args[0], 1, 0, kind, mode];
            data.extend(512u16.to_le_bytes());
            data.extend(500u16.to_le_bytes());
            data.extend(1i16.to_le_bytes());
            data.extend(0i16.to_le_bytes());
            data
        }
        0x04 => {
            let ports = if args[0] == 0xFF {
                0..3
            } else {
                args[0] as usize..args[0] as usize + 1
            };
            for port in ports {
                state.outputs[port].copy_from_slice(&args[..10]);
                state.outputs[port][0] = port as u8;
            }
            vec![]
        }
        0x06 => {
            let output = state.outputs[args[0] as usize];
            let mut data = output.to_vec();
            data.extend(90i32.to_le_bytes());
            data.extend(45i32.to_le_bytes());
            data.extend(360i32.to_le_bytes());
            data
        }
        0x09 => {
            let size = args[1] as usize;
            state
                .messages
                .push((args[0], args[2..2 + size - 1].to_vec()));
            vec![]
        }
        0x0B => 7400u16.to_le_bytes().to_vec(),
        0x88 => vec![0x7C, 0x01, 0x1F, 0x01],
        0x98 => {
            let end = args.iter().position(|&b| b == 0).unwrap_or(args.len());
            state.name = args[..end].to_vec();
            vec![]
        }
        0x9B => {
            let mut data = vec![0u8; 15];
            let n = state.name.len().min(15);
            data[..n].copy_from_slice(&state.name[..n]);
            data.extend([0x00, 0x16, 0x53, 0x0A, 0x0B, 0x0C, 0x00]);
            data.extend(180u32.to_le_bytes());
            data.extend(40_000u32.to_le_bytes());
            data
        }
        _ => vec![],
    }
}
