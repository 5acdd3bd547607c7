// src/focus_group.rs
// DISCUSSION ENGINE: drives participant agents through a moderated focus
// group and records everything as a transcript.

use crate::brain::GenerationService;
use crate::config::{DiscussionConfig, DiscussionMode};
use crate::coordinator::{Action, Coordinator, LlmCoordinator};
use crate::discussion_plan::{flow_prompts, transition_for, DiscussionFlow, FLOW_SCHEMA_HINT, MODERATOR_PHRASES};
use crate::error::{FocusGroupError, Result};
use crate::participant::{persona_engine_for, Participant, ParticipantAgent, PersonaEngine};
use crate::transcript::{EntryType, InteractionType, Transcript, TranscriptEntry, MODERATOR, SYSTEM};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

pub const AGENTIC_PHASE: &str = "agentic_flow";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEnd {
    Ended,
    WrappedUp,
    BudgetExhausted,
}

pub struct DiscussionModerator {
    brain: Arc<dyn GenerationService>,
    coordinator: Arc<dyn Coordinator>,
    personas: Arc<dyn PersonaEngine>,
    config: DiscussionConfig,
    llm_only: bool,
}

impl DiscussionModerator {
    pub fn new(brain: Arc<dyn GenerationService>, config: DiscussionConfig, llm_only: bool) -> Self {
        let coordinator = Arc::new(LlmCoordinator::new(brain.clone(), config.transcript_window));
        let personas = persona_engine_for(brain.clone(), llm_only);
        Self::with_parts(brain, coordinator, personas, config, llm_only)
    }

    pub fn with_parts(
        brain: Arc<dyn GenerationService>,
        coordinator: Arc<dyn Coordinator>,
        personas: Arc<dyn PersonaEngine>,
        config: DiscussionConfig,
        llm_only: bool,
    ) -> Self {
        Self {
            brain,
            coordinator,
            personas,
            config,
            llm_only,
        }
    }

    pub fn config(&self) -> &DiscussionConfig {
        &self.config
    }

    /// Runs one complete discussion. The transcript always opens with a
    /// System setup entry naming every participant and closes with a
    /// conclusion entry.
    pub fn run_discussion<R: Rng>(
        &self,
        participants: &[Participant],
        topic: &str,
        plan_text: Option<&str>,
        rng: &mut R,
    ) -> Result<Transcript> {
        if participants.is_empty() {
            return Err(FocusGroupError::InvalidInput(
                "a discussion needs at least one participant".to_string(),
            ));
        }
        info!(topic, participants = participants.len(), "starting discussion");

        let mut agents: Vec<ParticipantAgent> =
            participants.iter().cloned().map(ParticipantAgent::new).collect();
        let mut transcript = Transcript::new();

        transcript.push(
            TranscriptEntry::new(EntryType::Setup, SYSTEM, format!("Focus Group Discussion: {}", topic))
                .with_participants(participants.iter().map(|p| p.name.clone()).collect()),
        );
        self.pre_discussion(&agents, &mut transcript);

        let agentic = match self.config.mode {
            DiscussionMode::Auto => self.brain.enabled(),
            DiscussionMode::Agentic => true,
            DiscussionMode::PhaseFlow => false,
        };

        if agentic {
            match self.run_agentic_loop(&mut agents, participants, topic, plan_text, &mut transcript, rng) {
                Ok(end) => debug!(?end, "agentic loop finished"),
                Err(e) if self.llm_only => return Err(e),
                Err(e) => {
                    warn!(error = %e, "agentic loop abandoned, continuing with phase flow");
                    self.run_phase_flow(&mut agents, topic, plan_text, &mut transcript, rng)?;
                }
            }
        } else {
            self.run_phase_flow(&mut agents, topic, plan_text, &mut transcript, rng)?;
        }

        self.post_discussion(&agents, &mut transcript);
        info!(entries = transcript.len(), "discussion complete");
        Ok(transcript)
    }

    // =========================================================================
    // FLOW RESOLUTION
    // =========================================================================

    /// Service-generated flow when a backend is available, else the fixed
    /// template. Any service failure is fatal in LLM-only mode.
    pub fn resolve_flow(&self, topic: &str, plan_text: Option<&str>) -> Result<DiscussionFlow> {
        if !self.brain.enabled() {
            if self.llm_only {
                return Err(FocusGroupError::ServiceUnavailable(
                    "discussion flow requires a generation service".to_string(),
                ));
            }
            return Ok(DiscussionFlow::template(topic));
        }

        let (system, user) = flow_prompts(topic, plan_text);
        match self.brain.generate_structured(&system, &user, Some(FLOW_SCHEMA_HINT)) {
            Ok(doc) => match DiscussionFlow::from_document(&doc, topic) {
                Some(flow) => Ok(flow),
                None if self.llm_only => Err(FocusGroupError::MalformedResponse(
                    "discussion flow contained no valid phase".to_string(),
                )),
                None => {
                    warn!("generated flow had no valid phase, using template");
                    Ok(DiscussionFlow::template(topic))
                }
            },
            Err(e) if self.llm_only => Err(e.into()),
            Err(e) => {
                warn!(error = %e, "flow generation failed, using template");
                Ok(DiscussionFlow::template(topic))
            }
        }
    }

    // =========================================================================
    // PHASE FLOW
    // =========================================================================

    fn run_phase_flow<R: Rng>(
        &self,
        agents: &mut [ParticipantAgent],
        topic: &str,
        plan_text: Option<&str>,
        transcript: &mut Transcript,
        rng: &mut R,
    ) -> Result<()> {
        let flow = self.resolve_flow(topic, plan_text)?;
        debug!(phases = flow.phases.len(), questions = flow.question_count(), "running phase flow");

        for phase in &flow.phases {
            transcript.push(
                TranscriptEntry::new(
                    EntryType::PhaseStart,
                    MODERATOR,
                    format!("Let's move into {}.", phase.name.replace('_', " ")),
                )
                .with_phase(&phase.name),
            );

            for question in &phase.questions {
                transcript.push(
                    TranscriptEntry::new(EntryType::Question, MODERATOR, question).with_phase(&phase.name),
                );
                let responses = self.collect_responses(question, agents, topic, &phase.name, rng)?;
                let answered = !responses.is_empty();
                for entry in responses {
                    transcript.push(entry);
                }
                if let Some(entry) = self.group_dynamics(agents, &phase.name, rng) {
                    transcript.push(entry);
                }
                if answered {
                    if let Some(entry) = self.moderator_follow_up(rng) {
                        transcript.push(entry);
                    }
                }
            }

            if let Some(line) = transition_for(&phase.name) {
                transcript.push(TranscriptEntry::new(EntryType::Transition, MODERATOR, line));
            }
        }
        Ok(())
    }

    /// One reply per participant, in a fresh random order.
    fn collect_responses<R: Rng>(
        &self,
        question: &str,
        agents: &mut [ParticipantAgent],
        topic: &str,
        phase: &str,
        rng: &mut R,
    ) -> Result<Vec<TranscriptEntry>> {
        let mut order: Vec<usize> = (0..agents.len()).collect();
        order.shuffle(rng);

        let mut entries = Vec::with_capacity(order.len());
        for (position, idx) in order.into_iter().enumerate() {
            let agent = &mut agents[idx];
            let prompt = response_prompt(question, &agent.participant, topic, position == 0);
            agent.listen(prompt);
            let content = agent.act(self.personas.as_ref())?;
            if content.trim().is_empty() {
                continue;
            }
            entries.push(
                TranscriptEntry::new(EntryType::Response, agent.name(), content)
                    .with_phase(phase)
                    .with_speaking_order(position + 1)
                    .with_personality(agent.participant.personality_label()),
            );
            if !self.config.response_pause.is_zero() {
                thread::sleep(self.config.response_pause);
            }
        }
        Ok(entries)
    }

    fn group_dynamics<R: Rng>(
        &self,
        agents: &[ParticipantAgent],
        phase: &str,
        rng: &mut R,
    ) -> Option<TranscriptEntry> {
        if agents.len() < 2 || !chance(rng, self.config.interaction_probability) {
            return None;
        }
        let pair: Vec<&ParticipantAgent> = agents.choose_multiple(rng, 2).collect();
        let (speaker, target) = (pair[0].name(), pair[1].name());
        let kind = *InteractionType::ALL.choose(rng)?;
        Some(
            TranscriptEntry::new(EntryType::Interaction, speaker, kind.line(target))
                .with_phase(phase)
                .with_interaction(kind, target),
        )
    }

    fn moderator_follow_up<R: Rng>(&self, rng: &mut R) -> Option<TranscriptEntry> {
        if !chance(rng, self.config.follow_up_probability) {
            return None;
        }
        let phrase = MODERATOR_PHRASES.choose(rng)?;
        Some(TranscriptEntry::new(EntryType::ModeratorFollowUp, MODERATOR, *phrase))
    }

    // =========================================================================
    // AGENTIC LOOP
    // =========================================================================

    fn run_agentic_loop<R: Rng>(
        &self,
        agents: &mut [ParticipantAgent],
        roster: &[Participant],
        topic: &str,
        plan_text: Option<&str>,
        transcript: &mut Transcript,
        rng: &mut R,
    ) -> Result<LoopEnd> {
        transcript.push(
            TranscriptEntry::new(
                EntryType::PhaseStart,
                MODERATOR,
                format!("Let's begin our discussion about {}.", topic),
            )
            .with_phase(AGENTIC_PHASE),
        );

        for turn in 1..=self.config.max_agentic_turns {
            let directive = self.coordinator.propose_next_action(
                topic,
                roster,
                transcript.window(self.config.transcript_window),
                plan_text,
            )?;
            debug!(turn, action = ?directive.action, "coordinator directive");

            match directive.action {
                Action::End => return Ok(LoopEnd::Ended),
                Action::WrapUp => {
                    transcript.push(TranscriptEntry::new(
                        EntryType::WrapUp,
                        MODERATOR,
                        "Thank you all for the insightful discussion.",
                    ));
                    return Ok(LoopEnd::WrappedUp);
                }
                Action::AskQuestion => {
                    let question = directive
                        .moderator_question
                        .unwrap_or_else(|| format!("Could you share more about {}?", topic));
                    transcript.push(
                        TranscriptEntry::new(EntryType::Question, MODERATOR, &question)
                            .with_phase(AGENTIC_PHASE),
                    );
                    for entry in self.collect_responses(&question, agents, topic, AGENTIC_PHASE, rng)? {
                        transcript.push(entry);
                    }
                }
                Action::ParticipantTurn | Action::Interrupt => {
                    let idx = resolve_speaker(agents, directive.speaker.as_deref());
                    let agent = &mut agents[idx];
                    agent.listen(format!("Please share your thoughts about {}.", topic));
                    let content = agent.act(self.personas.as_ref())?;
                    if !content.trim().is_empty() {
                        let kind = if directive.action == Action::Interrupt {
                            EntryType::Interaction
                        } else {
                            EntryType::Response
                        };
                        transcript.push(
                            TranscriptEntry::new(kind, agent.name(), content)
                                .with_phase(AGENTIC_PHASE)
                                .with_personality(agent.participant.personality_label()),
                        );
                    }
                }
                Action::Other => {
                    transcript.push(
                        TranscriptEntry::new(
                            EntryType::Question,
                            MODERATOR,
                            format!("What stands out to you regarding {}?", topic),
                        )
                        .with_phase(AGENTIC_PHASE),
                    );
                    let prompt = format!("Regarding {}", topic);
                    for entry in self.collect_responses(&prompt, agents, topic, AGENTIC_PHASE, rng)? {
                        transcript.push(entry);
                    }
                }
            }
        }

        info!(turns = self.config.max_agentic_turns, "agentic turn budget exhausted");
        Ok(LoopEnd::BudgetExhausted)
    }

    // =========================================================================
    // ROOM MOMENTS
    // =========================================================================

    fn pre_discussion(&self, agents: &[ParticipantAgent], transcript: &mut Transcript) {
        transcript.push(TranscriptEntry::new(
            EntryType::Setup,
            MODERATOR,
            "Welcome everyone! Please make yourselves comfortable. We'll begin in just a moment.",
        ));

        const CHATTER: [&str; 3] = [
            "This room is quite nice! I've never done a focus group before.",
            "Same here! Are we being recorded?",
            "I brought some notes just in case.",
        ];
        for (agent, line) in agents.iter().zip(CHATTER) {
            transcript.push(TranscriptEntry::new(EntryType::Casual, agent.name(), line));
        }
        transcript.push(TranscriptEntry::new(
            EntryType::Casual,
            MODERATOR,
            "Perfect! I love seeing preparation. Let's officially begin.",
        ));
    }

    fn post_discussion(&self, agents: &[ParticipantAgent], transcript: &mut Transcript) {
        transcript.push(TranscriptEntry::new(
            EntryType::WrapUp,
            MODERATOR,
            "Thank you all for such an engaging discussion! This has been incredibly insightful.",
        ));
        if agents.len() >= 2 {
            transcript.push(TranscriptEntry::new(
                EntryType::Casual,
                agents[0].name(),
                "This was really interesting! I learned a lot from everyone.",
            ));
            transcript.push(TranscriptEntry::new(
                EntryType::Casual,
                agents[1].name(),
                "Same here! Thanks for sharing your experiences, everyone.",
            ));
        }
        transcript.push(TranscriptEntry::new(
            EntryType::Conclusion,
            SYSTEM,
            "Focus group discussion completed successfully.",
        ));
    }
}

fn chance<R: Rng>(rng: &mut R, probability: f64) -> bool {
    probability > 0.0 && (probability >= 1.0 || rng.gen_bool(probability))
}

/// Unknown or missing names resolve to the first participant.
fn resolve_speaker(agents: &[ParticipantAgent], name: Option<&str>) -> usize {
    match name.and_then(|n| agents.iter().position(|a| a.name() == n)) {
        Some(idx) => idx,
        None => {
            if let Some(n) = name {
                warn!(speaker = n, "unknown speaker in directive, using first participant");
            }
            0
        }
    }
}

pub fn response_prompt(question: &str, participant: &Participant, topic: &str, first_speaker: bool) -> String {
    let personality = if participant.personality_type.trim().is_empty() {
        "balanced"
    } else {
        participant.personality_type.as_str()
    };
    let mut prompt = format!(
        "The moderator just asked: \"{question}\"\n\n\
         As {name}, respond naturally based on your personality and background.\n\
         Topic: {topic}\n\n\
         Your response should:\n\
         - Be authentic to your personality type: {personality}\n\
         - Include specific details about your experiences\n\
         - Mention realistic prices, brands, or locations when relevant\n\
         - Show your budget constraints: {budget}\n\
         - Reflect your age ({age}) and occupation ({occupation})\n",
        question = question,
        name = participant.name,
        topic = topic,
        personality = personality,
        budget = participant.budget_label(),
        age = participant.age,
        occupation = participant.occupation_label(),
    );
    prompt.push_str(if first_speaker {
        "\nYou're speaking first, so set the tone for the discussion."
    } else {
        "\nBuild on what others have shared or offer a different perspective."
    });
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::DisabledBrain;
    use crate::coordinator::Directive;
    use crate::error::GenerationError;
    use crate::participant::LocalPersonaEngine;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    struct ScriptedCoordinator {
        script: Mutex<VecDeque<Result<Directive>>>,
    }

    impl ScriptedCoordinator {
        fn new(script: Vec<Result<Directive>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl Coordinator for ScriptedCoordinator {
        fn propose_next_action(
            &self,
            _topic: &str,
            _participants: &[Participant],
            _recent: &[TranscriptEntry],
            _plan_text: Option<&str>,
        ) -> Result<Directive> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Directive::new(Action::End)))
        }
    }

    fn roster() -> Vec<Participant> {
        ["Aditi", "Rahul", "Priya"].into_iter().map(Participant::named).collect()
    }

    fn phase_flow_moderator() -> DiscussionModerator {
        DiscussionModerator::new(Arc::new(DisabledBrain), DiscussionConfig::unpaced(), false)
    }

    fn agentic_moderator(script: Vec<Result<Directive>>, llm_only: bool) -> DiscussionModerator {
        let config = DiscussionConfig {
            mode: DiscussionMode::Agentic,
            ..DiscussionConfig::unpaced()
        };
        DiscussionModerator::with_parts(
            Arc::new(DisabledBrain),
            Arc::new(ScriptedCoordinator::new(script)),
            Arc::new(LocalPersonaEngine),
            config,
            llm_only,
        )
    }

    #[test]
    fn phase_flow_transcript_is_bracketed_by_setup_and_conclusion() {
        let mut rng = StdRng::seed_from_u64(11);
        let t = phase_flow_moderator()
            .run_discussion(&roster(), "skincare routines", None, &mut rng)
            .unwrap();

        let first = t.first().unwrap();
        assert_eq!(first.entry_type, EntryType::Setup);
        assert_eq!(first.content, "Focus Group Discussion: skincare routines");
        let named: HashSet<_> = first.participants.clone().unwrap().into_iter().collect();
        let expected: HashSet<_> = ["Aditi", "Rahul", "Priya"].iter().map(|s| s.to_string()).collect();
        assert_eq!(named, expected);
        assert_eq!(t.last().unwrap().entry_type, EntryType::Conclusion);
    }

    #[test]
    fn every_question_gets_one_response_per_participant_in_a_permutation() {
        let mut rng = StdRng::seed_from_u64(5);
        let t = phase_flow_moderator()
            .run_discussion(&roster(), "tea", None, &mut rng)
            .unwrap();

        assert_eq!(t.count_of(EntryType::Question), 22);
        assert_eq!(t.count_of(EntryType::Response), 66);
        assert_eq!(t.count_of(EntryType::Transition), 5);
        assert_eq!(t.count_of(EntryType::PhaseStart), 6);

        let entries = t.entries();
        for (i, e) in entries.iter().enumerate().filter(|(_, e)| e.entry_type == EntryType::Question) {
            let block: Vec<_> = entries[i + 1..i + 4].iter().collect();
            let speakers: HashSet<_> = block.iter().map(|r| r.speaker.as_str()).collect();
            assert_eq!(speakers.len(), 3);
            let orders: Vec<_> = block.iter().map(|r| r.speaking_order.unwrap()).collect();
            assert_eq!(orders, vec![1, 2, 3], "after {}", e.content);
        }
    }

    #[test]
    fn probabilities_of_one_always_inject_dynamics() {
        let config = DiscussionConfig {
            interaction_probability: 1.0,
            follow_up_probability: 1.0,
            ..DiscussionConfig::unpaced()
        };
        let moderator = DiscussionModerator::new(Arc::new(DisabledBrain), config, false);
        let mut rng = StdRng::seed_from_u64(2);
        let t = moderator.run_discussion(&roster(), "tea", None, &mut rng).unwrap();
        assert_eq!(t.count_of(EntryType::Interaction), 22);
        assert_eq!(t.count_of(EntryType::ModeratorFollowUp), 22);
        for e in t.iter().filter(|e| e.entry_type == EntryType::Interaction) {
            assert_ne!(Some(&e.speaker), e.target.as_ref());
        }
    }

    #[test]
    fn probabilities_of_zero_never_inject_dynamics() {
        let config = DiscussionConfig {
            interaction_probability: 0.0,
            follow_up_probability: 0.0,
            ..DiscussionConfig::unpaced()
        };
        let moderator = DiscussionModerator::new(Arc::new(DisabledBrain), config, false);
        let mut rng = StdRng::seed_from_u64(2);
        let t = moderator.run_discussion(&roster(), "tea", None, &mut rng).unwrap();
        assert_eq!(t.count_of(EntryType::Interaction), 0);
        assert_eq!(t.count_of(EntryType::ModeratorFollowUp), 0);
    }

    #[test]
    fn single_participant_gets_one_chatter_line_and_no_post_chatter() {
        let mut rng = StdRng::seed_from_u64(1);
        let t = phase_flow_moderator()
            .run_discussion(&[Participant::named("Solo")], "tea", None, &mut rng)
            .unwrap();
        let casual: Vec<_> = t.iter().filter(|e| e.entry_type == EntryType::Casual).collect();
        assert_eq!(casual.len(), 2);
        assert_eq!(casual[0].speaker, "Solo");
        assert_eq!(casual[1].speaker, MODERATOR);
    }

    #[test]
    fn empty_roster_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            phase_flow_moderator().run_discussion(&[], "tea", None, &mut rng),
            Err(FocusGroupError::InvalidInput(_))
        ));
    }

    #[test]
    fn agentic_loop_executes_directives_until_wrap_up() {
        let script = vec![
            Ok(Directive::ask("What do you pay for tea?")),
            Ok(Directive::turn("Rahul")),
            Ok(Directive::interrupt("Nobody")),
            Ok(Directive::new(Action::Other)),
            Ok(Directive::new(Action::WrapUp)),
            Ok(Directive::ask("never asked")),
        ];
        let mut rng = StdRng::seed_from_u64(9);
        let t = agentic_moderator(script, false)
            .run_discussion(&roster(), "tea", None, &mut rng)
            .unwrap();
        let entries = t.entries();

        let start = entries
            .iter()
            .position(|e| e.entry_type == EntryType::PhaseStart)
            .unwrap();
        assert_eq!(entries[start].content, "Let's begin our discussion about tea.");
        assert_eq!(entries[start + 1].content, "What do you pay for tea?");
        assert_eq!(entries[start + 5].speaker, "Rahul");
        assert_eq!(entries[start + 5].entry_type, EntryType::Response);
        assert_eq!(entries[start + 6].speaker, "Aditi");
        assert_eq!(entries[start + 6].entry_type, EntryType::Interaction);
        assert_eq!(entries[start + 7].content, "What stands out to you regarding tea?");
        assert_eq!(entries[start + 11].content, "Thank you all for the insightful discussion.");
        assert!(!t.iter().any(|e| e.content == "never asked"));
        assert_eq!(t.last().unwrap().entry_type, EntryType::Conclusion);
    }

    #[test]
    fn agentic_ask_without_question_uses_topic_fallback() {
        let mut rng = StdRng::seed_from_u64(9);
        let t = agentic_moderator(vec![Ok(Directive::new(Action::AskQuestion))], false)
            .run_discussion(&roster(), "tea", None, &mut rng)
            .unwrap();
        assert!(t.iter().any(|e| e.content == "Could you share more about tea?"));
    }

    #[test]
    fn turn_budget_bounds_the_loop() {
        let script = (0..50).map(|_| Ok(Directive::turn("Aditi"))).collect();
        let config = DiscussionConfig {
            mode: DiscussionMode::Agentic,
            max_agentic_turns: 4,
            ..DiscussionConfig::unpaced()
        };
        let moderator = DiscussionModerator::with_parts(
            Arc::new(DisabledBrain),
            Arc::new(ScriptedCoordinator::new(script)),
            Arc::new(LocalPersonaEngine),
            config,
            false,
        );
        let mut rng = StdRng::seed_from_u64(3);
        let t = moderator.run_discussion(&roster(), "tea", None, &mut rng).unwrap();
        assert_eq!(t.count_of(EntryType::Response), 4);
        assert_eq!(t.last().unwrap().entry_type, EntryType::Conclusion);
    }

    #[test]
    fn coordinator_failure_falls_back_to_template_flow() {
        let script = vec![
            Ok(Directive::turn("Priya")),
            Err(FocusGroupError::Generation(GenerationError::EmptyResponse)),
        ];
        let mut rng = StdRng::seed_from_u64(4);
        let t = agentic_moderator(script, false)
            .run_discussion(&roster(), "tea", None, &mut rng)
            .unwrap();
        assert_eq!(t.count_of(EntryType::Question), 22);
        assert_eq!(t.count_of(EntryType::Response), 67);
    }

    #[test]
    fn coordinator_failure_is_fatal_when_llm_only() {
        let script = vec![Err(FocusGroupError::Generation(GenerationError::EmptyResponse))];
        let mut rng = StdRng::seed_from_u64(4);
        let result = agentic_moderator(script, true).run_discussion(&roster(), "tea", None, &mut rng);
        assert!(matches!(
            result,
            Err(FocusGroupError::Generation(GenerationError::EmptyResponse))
        ));
    }

    #[test]
    fn disabled_service_is_fatal_for_flow_when_llm_only() {
        let moderator = DiscussionModerator::new(Arc::new(DisabledBrain), DiscussionConfig::unpaced(), true);
        assert!(matches!(
            moderator.resolve_flow("tea", None),
            Err(FocusGroupError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn prompts_distinguish_first_speaker() {
        let p = Participant::named("Aditi");
        assert!(response_prompt("Q?", &p, "tea", true).ends_with("set the tone for the discussion."));
        let later = response_prompt("Q?", &p, "tea", false);
        assert!(later.ends_with("offer a different perspective."));
        assert!(later.contains("personality type: balanced"));
        assert!(later.contains("moderate budget"));
    }
}
