//! Thread handoff between pipeline stages: a [Callback] runs its inner
//! stage on its own thread, fed through a bounded sync channel.

use crate::utils::Error;

use std::sync::mpsc;
use std::thread;

pub trait CallFinish: Send + 'static {
    type CallType: Send + 'static;
    type ReturnType: Send + 'static;
    type ErrorType: Send + 'static;

    fn call(&mut self, c: Self::CallType);
    fn finish(&mut self) -> std::result::Result<Self::ReturnType, Self::ErrorType>;
}

fn call_all<T: Send + 'static, U: Send + 'static, E: Send + 'static>(
    recv: mpsc::Receiver<T>,
    mut cf: Box<impl CallFinish<CallType = T, ReturnType = U, ErrorType = E>>,
) -> std::result::Result<U, E> {
    for m in recv.iter() {
        cf.call(m);
    }
    cf.finish()
}

pub struct Callback<T, U> {
    send: Option<mpsc::SyncSender<T>>,
    result: Option<thread::JoinHandle<std::result::Result<U, Error>>>,
}

impl<T, U> Callback<T, U>
where
    T: Send + 'static,
    U: Send + 'static,
{
    pub fn new(
        cf: Box<impl CallFinish<CallType = T, ReturnType = U, ErrorType = Error>>,
    ) -> Callback<T, U> {
        let (send, recv) = mpsc::sync_channel(1);
        let result = thread::spawn(move || call_all(recv, cf));
        Callback {
            send: Some(send),
            result: Some(result),
        }
    }
}

impl<T, U> CallFinish for Callback<T, U>
where
    T: Send + 'static,
    U: Send + 'static,
{
    type CallType = T;
    type ReturnType = U;
    type ErrorType = Error;

    fn call(&mut self, t: T) {
        match &self.send {
            Some(s) => {
                s.send(t).expect("failed to send");
            }
            None => {}
        }
    }

    fn finish(&mut self) -> std::result::Result<U, Error> {
        self.send = None;

        match self.result.take() {
            Some(r) => match r.join() {
                Ok(p) => p,
                Err(e) => Err(Error::Other(format!("failed to join {:?}", e))),
            },
            None => Err(Error::Other(String::from("already called finish"))),
        }
    }
}
