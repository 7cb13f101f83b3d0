use crate::{Effect, Msg, Phase, PollResult, RunState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested(query) => {
            // One run at a time; the controller reports the rejection to its caller.
            if state.phase() == Phase::Running {
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(2);
            if let Some(previous) = state.current_run().filter(|_| state.fetch_pending()) {
                effects.push(Effect::AbandonFetch { run_id: previous });
            }
            let run_id = state.begin_run();
            effects.push(Effect::StartJob { run_id, query });
            effects
        }
        Msg::PollReported { run_id, result } => {
            // Late reports from a superseded or cancelled run are dropped.
            if !state.is_current_run(run_id) || state.phase() != Phase::Running {
                return (state, Vec::new());
            }
            match result {
                PollResult::Running {
                    message,
                    steps_completed,
                } => {
                    state.apply_progress(message, steps_completed);
                    Vec::new()
                }
                PollResult::Completed => {
                    state.complete();
                    vec![Effect::FetchResults { run_id }]
                }
                PollResult::Failed(message) => {
                    state.fail(message);
                    Vec::new()
                }
            }
        }
        Msg::ResultsFetched { run_id, results } => {
            if !state.is_current_run(run_id) || !state.fetch_pending() {
                return (state, Vec::new());
            }
            state.install_results(results);
            Vec::new()
        }
        Msg::CancelRequested => match state.current_run() {
            Some(run_id) if state.phase() == Phase::Running => {
                state.cancel_polling();
                vec![Effect::StopPolling { run_id }]
            }
            Some(run_id) if state.fetch_pending() => {
                state.cancel_fetch();
                vec![Effect::AbandonFetch { run_id }]
            }
            _ => Vec::new(),
        },
    };

    (state, effects)
}
