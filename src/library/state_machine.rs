use std::marker::PhantomData;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Event loop for a reducer: owns the state, applies `transition_fn` to every
/// incoming event, renders the new state and runs each returned effect on its
/// own thread. Effects report back by sending events through the channel.
pub struct StateMachine<TState, TEvent, TEffect, T, R, E>
where
    T: Fn(TState, TEvent) -> (TState, Vec<TEffect>),
    R: Fn(&TState),
    E: Fn(TEffect, Sender<TEvent>) + Send + Sync,
{
    state: TState,
    init_effects: Option<Vec<TEffect>>,
    transition_fn: T,
    render_fn: R,
    run_effect_fn: Arc<E>,
    event_sender: Sender<TEvent>,
    event_receiver: Receiver<TEvent>,
    _effect: PhantomData<TEffect>,
}

impl<TState, TEvent, TEffect, T, R, E> StateMachine<TState, TEvent, TEffect, T, R, E>
where
    TState: Clone,
    TEvent: Send + 'static,
    TEffect: Send + 'static,
    T: Fn(TState, TEvent) -> (TState, Vec<TEffect>),
    R: Fn(&TState),
    E: Fn(TEffect, Sender<TEvent>) + Send + Sync + 'static,
{
    pub fn new(
        init: (TState, Vec<TEffect>),
        transition_fn: T,
        render_fn: R,
        run_effect_fn: E,
    ) -> Self {
        let (event_sender, event_receiver) = channel();
        let (state, effects) = init;

        Self {
            state,
            init_effects: Some(effects),
            transition_fn,
            render_fn,
            run_effect_fn: Arc::new(run_effect_fn),
            event_sender,
            event_receiver,
            _effect: PhantomData,
        }
    }

    /// Sender for events originating outside the machine, e.g. user input.
    pub fn sender(&self) -> Sender<TEvent> {
        self.event_sender.clone()
    }

    #[allow(dead_code)]
    pub fn state(&self) -> &TState {
        &self.state
    }

    /// Renders the initial state and spawns the initial effects. Only the
    /// first call has any effect.
    pub fn start(&mut self) {
        if let Some(effects) = self.init_effects.take() {
            (self.render_fn)(&self.state);
            self.spawn_effects(effects);
        }
    }

    /// Waits up to `timeout` for one event and applies it. Returns `Ok(false)`
    /// when no event arrived in time.
    #[allow(dead_code)]
    pub fn step(&mut self, timeout: Duration) -> Result<bool, RecvTimeoutError> {
        self.start();

        match self.event_receiver.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(event);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.start();

        loop {
            let event = self.event_receiver.recv()?;
            self.apply(event);
        }
    }

    fn apply(&mut self, event: TEvent) {
        let (new_state, effects) = (self.transition_fn)(self.state.clone(), event);
        self.state = new_state;
        (self.render_fn)(&self.state);
        self.spawn_effects(effects);
    }

    fn spawn_effects(&self, effects: Vec<TEffect>) {
        for effect in effects {
            let effect_sender = self.event_sender.clone();
            let run_effect_fn = Arc::clone(&self.run_effect_fn);
            std::thread::spawn(move || {
                run_effect_fn(effect, effect_sender);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug)]
    enum Event {
        Add(i32),
        AddDone(i32),
    }

    #[derive(Debug)]
    enum Effect {
        Double(i32),
    }

    #[test]
    fn test_effects_feed_events_back_into_the_loop() {
        let rendered = Arc::new(Mutex::new(Vec::new()));
        let rendered_clone = rendered.clone();

        let mut machine = StateMachine::new(
            (0, vec![Effect::Double(1)]),
            |state: i32, event: Event| match event {
                Event::Add(n) => (state + n, vec![Effect::Double(n)]),
                Event::AddDone(n) => (state + n, vec![]),
            },
            move |state: &i32| rendered_clone.lock().unwrap().push(*state),
            |effect: Effect, sender: Sender<Event>| match effect {
                Effect::Double(n) => {
                    let _ = sender.send(Event::AddDone(n * 2));
                }
            },
        );

        machine.start();
        assert!(machine.step(Duration::from_secs(5)).unwrap());
        assert_eq!(*machine.state(), 2);

        machine.sender().send(Event::Add(3)).unwrap();
        assert!(machine.step(Duration::from_secs(5)).unwrap());
        assert_eq!(*machine.state(), 5);

        assert!(machine.step(Duration::from_secs(5)).unwrap());
        assert_eq!(*machine.state(), 11);

        assert_eq!(*rendered.lock().unwrap(), vec![0, 2, 5, 11]);
    }

    #[test]
    fn test_step_times_out_without_events() {
        let mut machine = StateMachine::new(
            ((), Vec::<Effect>::new()),
            |state: (), _event: Event| (state, vec![]),
            |_state: &()| {},
            |_effect: Effect, _sender: Sender<Event>| {},
        );

        assert!(!machine.step(Duration::from_millis(10)).unwrap());
    }
}
